//! End-to-end: resolution, force override, validation gate, lifecycle

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use mason_errors::{Error, LifecycleError};
use mason_lifecycle::{
    BuildArtifacts, CapabilityDescriptor, Installer, Orchestrator, PackageTree, SourceFetcher,
    SourceTree, ToolchainRunner,
};
use mason_recipe::{Condition, MemoryStore, Recipe, RecipeStore};
use mason_resolver::{validate, GraphBuilder, ResolvedNode};
use mason_types::{settings, OptionMap, PackageSpec, Settings, Version};

fn version(s: &str) -> Version {
    Version::parse(s).unwrap()
}

fn spec(s: &str) -> PackageSpec {
    PackageSpec::parse(s).unwrap()
}

/// The root requires libp loosely and libq; libq forces a specific
/// libp version; the root refuses shared builds on windows.
fn store() -> MemoryStore {
    MemoryStore::new()
        .with(Recipe::builder("libp", version("1.0.0")).finish().unwrap())
        .with(Recipe::builder("libp", version("1.5.0")).finish().unwrap())
        .with(Recipe::builder("libp", version("2.0.0")).finish().unwrap())
        .with(
            Recipe::builder("libq", version("1.0.0"))
                .requires(spec("libp==1.5.0"), true)
                .build_requires(spec("cmake>=3.16.0"))
                .finish()
                .unwrap(),
        )
        .with(
            Recipe::builder("rootpkg", version("0.1.0"))
                .settings([settings::OS, settings::ARCH])
                .bool_option("shared", false)
                .requires(spec("libp>=1.0.0"), false)
                .requires(spec("libq==1.0.0"), false)
                .reject_when(
                    Condition::setting_equals(settings::OS, "windows")
                        .and(Condition::option_true("shared")),
                    "shared builds are not supported on windows",
                )
                .finish()
                .unwrap(),
        )
}

struct CountingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl SourceFetcher for CountingFetcher {
    async fn fetch(&self, node: &ResolvedNode) -> Result<SourceTree, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SourceTree::new(format!("/work/src/{}", node.name())))
    }
}

struct NoopRunner;

#[async_trait]
impl ToolchainRunner for NoopRunner {
    async fn generate(
        &self,
        _node: &ResolvedNode,
        _source: &SourceTree,
        _dependencies: &[CapabilityDescriptor],
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn build(
        &self,
        _node: &ResolvedNode,
        source: &SourceTree,
    ) -> Result<BuildArtifacts, Error> {
        Ok(BuildArtifacts::new(source.root.join("build")))
    }
}

struct NoopInstaller;

#[async_trait]
impl Installer for NoopInstaller {
    async fn install(
        &self,
        _node: &ResolvedNode,
        artifacts: BuildArtifacts,
    ) -> Result<PackageTree, Error> {
        Ok(PackageTree::new(artifacts.root.join("pkg")))
    }
}

#[test]
fn force_override_resolves_but_windows_shared_fails_validation() {
    let store = store();
    let target = Settings::new()
        .with(settings::OS, "windows")
        .with(settings::ARCH, "x86_64");
    let root = store.load("rootpkg", &"*".parse().unwrap()).unwrap();

    let graph = GraphBuilder::new(&store)
        .build(root, &target, &OptionMap::new().with("shared", true))
        .unwrap();

    // The loose requirement picked 2.0.0 first; libq's force override
    // pinned 1.5.0 and the root's constraint still holds.
    assert_eq!(graph.version_of("libp"), Some(&version("1.5.0")));

    // Build requirements never become graph nodes.
    assert!(!graph.contains("cmake"));

    let failures = validate(&graph, &target);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].package, "rootpkg");
}

#[tokio::test]
async fn orchestrator_stops_at_validated_on_rejection() {
    let store = store();
    let target = Settings::new()
        .with(settings::OS, "windows")
        .with(settings::ARCH, "x86_64");
    let root = store.load("rootpkg", &"*".parse().unwrap()).unwrap();
    let graph = GraphBuilder::new(&store)
        .build(root, &target, &OptionMap::new().with("shared", true))
        .unwrap();

    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
    });
    let orchestrator = Orchestrator::new(
        Arc::clone(&fetcher) as Arc<dyn SourceFetcher>,
        Arc::new(NoopRunner),
        Arc::new(NoopInstaller),
    );

    let err = orchestrator.run(&graph, &target).await.unwrap_err();
    match err {
        Error::Lifecycle(LifecycleError::ValidationRejected { failures }) => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].contains("rootpkg"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // No lifecycle phase beyond Validated ran.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn same_graph_builds_cleanly_on_linux_static() {
    let store = store();
    let target = Settings::new()
        .with(settings::OS, "linux")
        .with(settings::ARCH, "x86_64");
    let root = store.load("rootpkg", &"*".parse().unwrap()).unwrap();
    let graph = GraphBuilder::new(&store)
        .build(root, &target, &OptionMap::new())
        .unwrap();

    assert!(validate(&graph, &target).is_empty());

    let orchestrator = Orchestrator::new(
        Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(NoopRunner),
        Arc::new(NoopInstaller),
    )
    .with_workers(2);

    let report = orchestrator.run(&graph, &target).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.described.len(), 3);

    // Dependencies are described before their dependents.
    let order: Vec<_> = report.described.iter().map(|id| id.name.as_str()).collect();
    let pos = |n: &str| order.iter().position(|x| *x == n).unwrap();
    assert!(pos("libp") < pos("rootpkg"));
    assert!(pos("libq") < pos("rootpkg"));
}
