//! Integration tests for config

use mason_config::Config;
use mason_types::settings;
use std::io::Write;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[general]
workers = 8

[build]
network_access = false
fail_fast = true

[settings]
os = "macos"
arch = "arm64"
compiler = "apple-clang"
build_type = "Release"
"#
    )
    .unwrap();

    let config = Config::load_from(temp_file.path()).await.unwrap();
    assert_eq!(config.general.workers, 8);
    assert!(!config.build.network_access);
    assert!(config.build.fail_fast);

    let target = config.target_settings();
    assert_eq!(target.get(settings::OS), Some("macos"));
    assert_eq!(target.get(settings::ARCH), Some("arm64"));
    assert_eq!(target.get(settings::COMPILER), Some("apple-clang"));
}

#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[settings]\nos = \"linux\"\n").unwrap();

    let config = Config::load_from(temp_file.path()).await.unwrap();
    assert_eq!(config.general.workers, 0);
    assert!(config.effective_workers() >= 1);
    assert!(config.build.network_access);
    assert!(!config.build.fail_fast);
    assert_eq!(config.target_settings().os(), Some("linux"));
}

#[tokio::test]
async fn test_malformed_config_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[general]\nworkers = \"many\"\n").unwrap();

    assert!(Config::load_from(temp_file.path()).await.is_err());
}
