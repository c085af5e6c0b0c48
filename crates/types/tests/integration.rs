//! Integration tests for types

use mason_types::*;
use std::str::FromStr;

#[test]
fn test_version_spec_complex() {
    let spec = VersionSpec::from_str(">=1.2.0,<2.0.0,!=1.5.0").unwrap();

    assert!(!spec.matches(&Version::parse("1.1.9").unwrap()));
    assert!(spec.matches(&Version::parse("1.2.0").unwrap()));
    assert!(spec.matches(&Version::parse("1.4.9").unwrap()));
    assert!(!spec.matches(&Version::parse("1.5.0").unwrap())); // Excluded
    assert!(spec.matches(&Version::parse("1.5.1").unwrap()));
    assert!(spec.matches(&Version::parse("1.9.9").unwrap()));
    assert!(!spec.matches(&Version::parse("2.0.0").unwrap()));
}

#[test]
fn test_package_spec_with_complex_version() {
    let spec = PackageSpec::parse("libfoo>=2.0.0,<3.0.0,!=2.5.0").unwrap();
    assert_eq!(spec.name, "libfoo");
    assert!(spec.version_spec.matches(&Version::parse("2.4.0").unwrap()));
    assert!(!spec.version_spec.matches(&Version::parse("2.5.0").unwrap()));
}

#[test]
fn test_settings_projection_preserves_subset() {
    let target = Settings::new()
        .with(settings::OS, "linux")
        .with(settings::ARCH, "aarch64")
        .with(settings::COMPILER, "clang")
        .with(settings::BUILD_TYPE, "Debug");

    let projected = target.project([settings::OS, settings::BUILD_TYPE]);
    assert_eq!(projected.os(), Some("linux"));
    assert_eq!(projected.build_type(), Some("Debug"));
    assert_eq!(projected.compiler(), None);
}

#[test]
fn test_option_schema_and_map_roundtrip() {
    let schema = OptionSchema::new()
        .with_bool("shared")
        .with("runtime", [OptionValue::from("md"), OptionValue::from("mt")]);

    let options = OptionMap::new().with("shared", false).with("runtime", "md");
    for (name, value) in options.iter() {
        assert!(schema.allows(name, value), "{name} should allow {value}");
    }

    let json = serde_json::to_string(&options).unwrap();
    let back: OptionMap = serde_json::from_str(&json).unwrap();
    assert_eq!(options, back);
}

#[test]
fn test_capabilities_serde_roundtrip() {
    let caps = Capabilities::new().with_component(
        "core",
        Component::new()
            .with_library("foo")
            .with_system_library("m")
            .with_property("pkg_config_name", "foo"),
    );

    let json = serde_json::to_string(&caps).unwrap();
    let back: Capabilities = serde_json::from_str(&json).unwrap();
    assert_eq!(caps, back);
}
