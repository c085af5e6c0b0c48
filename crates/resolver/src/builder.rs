//! Dependency graph construction
//!
//! A worklist traversal, breadth-first from the root: each package is
//! expanded (options resolved, requirement rules evaluated) and its
//! edges reconciled against the versions already chosen. Traversal
//! order is fixed - queue order between packages, rule-declaration
//! order within one - so a given input always produces the identical
//! graph. That determinism is a correctness requirement, not an
//! optimization.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use mason_errors::{Error, ResolveError};
use mason_events::{AppEvent, EventEmitter, EventSender, ResolverEvent};
use mason_recipe::{
    evaluate_build_requirements, evaluate_requirements, resolve_options, Recipe, RecipeStore,
    RequirementEdge,
};
use mason_types::{DepKind, OptionMap, Settings, Version};

use crate::graph::{EdgeRecord, ResolvedGraph, ResolvedNode};

/// Per-name resolution slot. The single mutable place a package's
/// chosen version lives during construction.
struct Slot {
    recipe: Arc<Recipe>,
    version: Version,
    options: OptionMap,
    settings: Settings,
    /// A force edge pinned this version
    forced: bool,
    /// Requirer of the winning force edge
    forced_by: String,
    /// Requirer and constraint that first introduced this name
    introduced_by: String,
    introduced_constraint: String,
    /// Version whose rules have been evaluated, if any
    expanded_version: Option<Version>,
    runtime_deps: Vec<String>,
    build_requires: Vec<RequirementEdge>,
}

impl Slot {
    fn new(recipe: Arc<Recipe>, introduced_by: &str, introduced_constraint: String) -> Self {
        let version = recipe.version().clone();
        Self {
            recipe,
            version,
            options: OptionMap::new(),
            settings: Settings::new(),
            forced: false,
            forced_by: String::new(),
            introduced_by: introduced_by.to_string(),
            introduced_constraint,
            expanded_version: None,
            runtime_deps: Vec::new(),
            build_requires: Vec::new(),
        }
    }
}

/// Builds a [`ResolvedGraph`] from a root recipe and target settings.
pub struct GraphBuilder<'a> {
    store: &'a dyn RecipeStore,
    events: Option<EventSender>,
}

impl EventEmitter for GraphBuilder<'_> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl<'a> GraphBuilder<'a> {
    pub fn new(store: &'a dyn RecipeStore) -> Self {
        Self {
            store,
            events: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Resolve the full graph reachable from `root`.
    ///
    /// Any failure aborts construction; no partial graph is returned.
    ///
    /// # Errors
    ///
    /// Returns option errors from resolution, `RecipeError::NotFound`
    /// from the store, and `ResolveError` variants for version
    /// conflicts and cycles.
    pub fn build(
        &self,
        root: Arc<Recipe>,
        settings: &Settings,
        root_options: &OptionMap,
    ) -> Result<ResolvedGraph, Error> {
        let root_name = root.name().to_string();
        self.emit(AppEvent::Resolver(ResolverEvent::ResolutionStarted {
            root: root_name.clone(),
        }));

        let mut slots: BTreeMap<String, Slot> = BTreeMap::new();
        slots.insert(
            root_name.clone(),
            Slot::new(root, &root_name, "==root".to_string()),
        );

        let mut queue: VecDeque<String> = VecDeque::from([root_name.clone()]);
        let mut edge_log: Vec<EdgeRecord> = Vec::new();

        while let Some(name) = queue.pop_front() {
            let (recipe, version) = {
                let slot = &slots[&name];
                if slot.expanded_version.as_ref() == Some(&slot.version) {
                    continue;
                }
                (Arc::clone(&slot.recipe), slot.version.clone())
            };

            // Root overrides apply to the root only; dependencies resolve
            // from their own defaults.
            let requested = if name == root_name {
                root_options.clone()
            } else {
                OptionMap::new()
            };

            let projected =
                settings.project(recipe.settings_keys().iter().map(String::as_str));
            let effective = resolve_options(&recipe, &projected, &requested)?;
            let edges = evaluate_requirements(&recipe, &projected, &effective);
            let build_requires = evaluate_build_requirements(&recipe, &projected, &effective);

            {
                let slot = slots.get_mut(&name).expect("slot exists");
                slot.options = effective;
                slot.settings = projected;
                slot.expanded_version = Some(version.clone());
                slot.runtime_deps.clear();
                slot.build_requires = build_requires;
            }

            for edge in &edges {
                self.process_edge(&name, &version, edge, &mut slots, &mut queue, &mut edge_log)?;
            }

            self.emit(AppEvent::Resolver(ResolverEvent::PackageResolved {
                package: mason_types::PackageId::new(name.clone(), version),
            }));
        }

        let graph = Self::finish(root_name, slots, edge_log);

        if let Some(cycle) = graph.find_cycle() {
            return Err(ResolveError::CyclicDependency { cycle }.into());
        }

        self.emit(AppEvent::Resolver(ResolverEvent::ResolutionCompleted {
            packages: graph.len(),
        }));
        Ok(graph)
    }

    /// Reconcile one evaluated edge against the slot index.
    fn process_edge(
        &self,
        from: &str,
        from_version: &Version,
        edge: &RequirementEdge,
        slots: &mut BTreeMap<String, Slot>,
        queue: &mut VecDeque<String>,
        edge_log: &mut Vec<EdgeRecord>,
    ) -> Result<(), Error> {
        let target = edge.name().to_string();
        let constraint = edge.spec.version_spec.clone();

        edge_log.push(EdgeRecord {
            seq: edge_log.len(),
            from: from.to_string(),
            from_version: from_version.clone(),
            to: target.clone(),
            constraint: constraint.clone(),
            force: edge.force,
            kind: DepKind::Runtime,
        });

        {
            let requirer = slots.get_mut(from).expect("requirer slot exists");
            if !requirer.runtime_deps.iter().any(|dep| dep == &target) {
                requirer.runtime_deps.push(target.clone());
            }
        }

        if !slots.contains_key(&target) {
            // Unseen name: load and enqueue.
            let recipe = self.store.load(&target, &constraint)?;
            let mut slot = Slot::new(recipe, from, constraint.to_string());
            if edge.force {
                slot.forced = true;
                slot.forced_by = from.to_string();
            }
            slots.insert(target.clone(), slot);
            queue.push_back(target);
            return Ok(());
        }

        let slot = slots.get_mut(&target).expect("slot exists");

        if constraint.matches(&slot.version) {
            // Keep the existing choice; the first force edge to arrive
            // pins it.
            if edge.force && !slot.forced {
                slot.forced = true;
                slot.forced_by = from.to_string();
            }
            return Ok(());
        }

        if edge.force {
            if slot.forced {
                // An earlier force edge already won; later ones defer.
                return Ok(());
            }

            // Override the existing choice and re-validate every active
            // edge pointing at this name against the new version.
            let recipe = self.store.load(&target, &constraint)?;
            let previous = slot.version.clone();
            slot.recipe = Arc::clone(&recipe);
            slot.version = recipe.version().clone();
            slot.forced = true;
            slot.forced_by = from.to_string();
            let chosen = slot.version.clone();

            for record in edge_log.iter().filter(|r| r.to == target && !r.force) {
                let active = slots
                    .get(&record.from)
                    .is_some_and(|s| s.version == record.from_version);
                if active && !record.constraint.matches(&chosen) {
                    return Err(ResolveError::VersionConflict {
                        name: target,
                        requirer: record.from.clone(),
                        constraint: record.constraint.to_string(),
                        chosen: chosen.to_string(),
                        forced_by: from.to_string(),
                    }
                    .into());
                }
            }

            self.emit(AppEvent::Resolver(ResolverEvent::VersionOverridden {
                name: target.clone(),
                previous: previous.to_string(),
                chosen: chosen.to_string(),
                forced_by: from.to_string(),
            }));

            queue.push_back(target);
            return Ok(());
        }

        // Non-force edge that the chosen version does not satisfy.
        if slot.forced {
            return Err(ResolveError::VersionConflict {
                name: target,
                requirer: from.to_string(),
                constraint: constraint.to_string(),
                chosen: slot.version.to_string(),
                forced_by: slot.forced_by.clone(),
            }
            .into());
        }

        Err(ResolveError::UnresolvableVersionConflict {
            name: target,
            first_requirer: slot.introduced_by.clone(),
            first_constraint: slot.introduced_constraint.clone(),
            second_requirer: from.to_string(),
            second_constraint: constraint.to_string(),
        }
        .into())
    }

    /// Keep only nodes reachable from the root and freeze the graph.
    fn finish(
        root: String,
        slots: BTreeMap<String, Slot>,
        edge_log: Vec<EdgeRecord>,
    ) -> ResolvedGraph {
        let mut reachable: Vec<String> = vec![root.clone()];
        let mut queue: VecDeque<&str> = VecDeque::from([root.as_str()]);
        while let Some(name) = queue.pop_front() {
            if let Some(slot) = slots.get(name) {
                for dep in &slot.runtime_deps {
                    if !reachable.contains(dep) {
                        reachable.push(dep.clone());
                        queue.push_back(dep);
                    }
                }
            }
        }

        let nodes = slots
            .into_iter()
            .filter(|(name, _)| reachable.contains(name))
            .map(|(name, slot)| {
                let node = ResolvedNode {
                    recipe: slot.recipe,
                    version: slot.version,
                    options: slot.options,
                    settings: slot.settings,
                    deps: slot.runtime_deps,
                    build_requires: slot.build_requires,
                };
                (name, node)
            })
            .collect();

        ResolvedGraph::new(root, nodes, edge_log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mason_recipe::{Condition, MemoryStore};
    use mason_types::{settings, PackageSpec};

    fn version(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn spec(s: &str) -> PackageSpec {
        PackageSpec::parse(s).unwrap()
    }

    fn leaf(name: &str, v: &str) -> Recipe {
        Recipe::builder(name, version(v)).finish().unwrap()
    }

    fn linux() -> Settings {
        Settings::new()
            .with(settings::OS, "linux")
            .with(settings::ARCH, "x86_64")
    }

    #[test]
    fn test_single_chain() {
        let store = MemoryStore::new().with(leaf("zlib", "1.3.1")).with(
            Recipe::builder("libpng", version("1.6.43"))
                .requires(spec("zlib>=1.2.0"), false)
                .finish()
                .unwrap(),
        );

        let root = store.load("libpng", &"*".parse().unwrap()).unwrap();
        let graph = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.dependencies_of("libpng"), &["zlib".to_string()]);
        assert_eq!(graph.version_of("zlib"), Some(&version("1.3.1")));
    }

    #[test]
    fn test_diamond_shared_version() {
        // app -> b -> z, app -> c -> z; both accept the same z.
        let store = MemoryStore::new()
            .with(leaf("z", "1.0.0"))
            .with(
                Recipe::builder("b", version("1.0.0"))
                    .requires(spec("z>=1.0.0"), false)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("c", version("1.0.0"))
                    .requires(spec("z>=0.9.0"), false)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("app", version("0.1.0"))
                    .requires(spec("b==1.0.0"), false)
                    .requires(spec("c==1.0.0"), false)
                    .finish()
                    .unwrap(),
            );

        let root = store.load("app", &"*".parse().unwrap()).unwrap();
        let graph = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap();

        assert_eq!(graph.len(), 4);
        // One node per name, shared by both paths.
        assert_eq!(graph.dependents_of("z").len(), 2);
    }

    #[test]
    fn test_force_wins_diamond() {
        // a forces libb 2.0; c wants >=1.0 (satisfied by 2.0): no error.
        let store = MemoryStore::new()
            .with(leaf("libb", "1.0.0"))
            .with(leaf("libb", "2.0.0"))
            .with(
                Recipe::builder("c", version("1.0.0"))
                    .requires(spec("libb>=1.0.0"), false)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("a", version("1.0.0"))
                    .requires(spec("libb==2.0.0"), true)
                    .requires(spec("c==1.0.0"), false)
                    .finish()
                    .unwrap(),
            );

        let root = store.load("a", &"*".parse().unwrap()).unwrap();
        let graph = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap();

        assert_eq!(graph.version_of("libb"), Some(&version("2.0.0")));
    }

    #[test]
    fn test_force_override_revalidates_existing_edges() {
        // c's constraint pins libb to 1.x; a's later force to 2.0 breaks it.
        let store = MemoryStore::new()
            .with(leaf("libb", "1.0.0"))
            .with(leaf("libb", "2.0.0"))
            .with(
                Recipe::builder("c", version("1.0.0"))
                    .requires(spec("libb>=1.0.0,<2.0.0"), false)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("a", version("1.0.0"))
                    .requires(spec("c==1.0.0"), false)
                    .requires(spec("libb==2.0.0"), true)
                    .finish()
                    .unwrap(),
            );

        let root = store.load("a", &"*".parse().unwrap()).unwrap();
        // a's force edge pins 2.0.0 before c expands; c's non-force
        // constraint then fails against the pin.
        let err = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap_err();
        assert_eq!(err.code(), "resolve.version_conflict");
    }

    #[test]
    fn test_late_force_override_breaks_earlier_constraint() {
        // The root's bounded constraint resolves libz 1.5.0 first; q's
        // force then overrides to 2.0.0, and re-validation of the
        // root's logged edge fails.
        let store = MemoryStore::new()
            .with(leaf("libz", "1.5.0"))
            .with(leaf("libz", "2.0.0"))
            .with(
                Recipe::builder("q", version("1.0.0"))
                    .requires(spec("libz==2.0.0"), true)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("app", version("0.1.0"))
                    .requires(spec("libz>=1.0.0,<2.0.0"), false)
                    .requires(spec("q==1.0.0"), false)
                    .finish()
                    .unwrap(),
            );

        let root = store.load("app", &"*".parse().unwrap()).unwrap();
        let err = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap_err();

        match err {
            Error::Resolve(ResolveError::VersionConflict {
                name,
                requirer,
                forced_by,
                ..
            }) => {
                assert_eq!(name, "libz");
                assert_eq!(requirer, "app");
                assert_eq!(forced_by, "q");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unresolvable_conflict_without_force() {
        let store = MemoryStore::new()
            .with(leaf("z", "1.0.0"))
            .with(leaf("z", "2.0.0"))
            .with(
                Recipe::builder("b", version("1.0.0"))
                    .requires(spec("z==1.0.0"), false)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("c", version("1.0.0"))
                    .requires(spec("z==2.0.0"), false)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("app", version("0.1.0"))
                    .requires(spec("b==1.0.0"), false)
                    .requires(spec("c==1.0.0"), false)
                    .finish()
                    .unwrap(),
            );

        let root = store.load("app", &"*".parse().unwrap()).unwrap();
        let err = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap_err();

        match err {
            Error::Resolve(ResolveError::UnresolvableVersionConflict {
                name,
                first_requirer,
                second_requirer,
                ..
            }) => {
                assert_eq!(name, "z");
                assert_eq!(first_requirer, "b");
                assert_eq!(second_requirer, "c");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_earliest_force_wins_by_rule_order() {
        let store_with_root = |first: &str, second: &str| {
            MemoryStore::new()
                .with(leaf("z", "1.0.0"))
                .with(leaf("z", "2.0.0"))
                .with(
                    Recipe::builder("app", version("0.1.0"))
                        .requires(spec(first), true)
                        .requires(spec(second), true)
                        .finish()
                        .unwrap(),
                )
        };

        // First-declared force wins; the later force defers to it.
        let store = store_with_root("z==1.0.0", "z==2.0.0");
        let root = store.load("app", &"*".parse().unwrap()).unwrap();
        let graph = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap();
        assert_eq!(graph.version_of("z"), Some(&version("1.0.0")));

        // Swapping declaration order swaps the winner.
        let store = store_with_root("z==2.0.0", "z==1.0.0");
        let root = store.load("app", &"*".parse().unwrap()).unwrap();
        let graph = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap();
        assert_eq!(graph.version_of("z"), Some(&version("2.0.0")));
    }

    #[test]
    fn test_mutual_requirement_is_cyclic() {
        let store = MemoryStore::new()
            .with(
                Recipe::builder("a", version("1.0.0"))
                    .requires(spec("b==1.0.0"), false)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("b", version("1.0.0"))
                    .requires(spec("a==1.0.0"), false)
                    .finish()
                    .unwrap(),
            );

        let root = store.load("a", &"*".parse().unwrap()).unwrap();
        let err = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap_err();

        match err {
            Error::Resolve(ResolveError::CyclicDependency { cycle }) => {
                assert!(cycle.contains(&"a".to_string()));
                assert!(cycle.contains(&"b".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_conditional_requirement_keyed_on_settings() {
        let store = MemoryStore::new().with(leaf("winpthreads", "1.0.0")).with(
            Recipe::builder("app", version("0.1.0"))
                .settings([settings::OS])
                .requires_when(
                    Condition::setting_equals(settings::OS, "windows"),
                    spec("winpthreads==1.0.0"),
                    false,
                )
                .finish()
                .unwrap(),
        );

        let root = store.load("app", &"*".parse().unwrap()).unwrap();

        let graph = GraphBuilder::new(&store)
            .build(Arc::clone(&root), &linux(), &OptionMap::new())
            .unwrap();
        assert_eq!(graph.len(), 1);

        let windows = Settings::new().with(settings::OS, "windows");
        let graph = GraphBuilder::new(&store)
            .build(root, &windows, &OptionMap::new())
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.contains("winpthreads"));
    }

    #[test]
    fn test_determinism_repeated_builds() {
        let store = MemoryStore::new()
            .with(leaf("z", "1.0.0"))
            .with(
                Recipe::builder("b", version("1.0.0"))
                    .bool_option("shared", false)
                    .requires(spec("z>=1.0.0"), false)
                    .finish()
                    .unwrap(),
            )
            .with(
                Recipe::builder("app", version("0.1.0"))
                    .requires(spec("b==1.0.0"), false)
                    .requires(spec("z==1.0.0"), false)
                    .finish()
                    .unwrap(),
            );

        let root = store.load("app", &"*".parse().unwrap()).unwrap();
        let first = GraphBuilder::new(&store)
            .build(Arc::clone(&root), &linux(), &OptionMap::new())
            .unwrap();
        let second = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap();

        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.edge_log().len(), second.edge_log().len());
    }

    #[test]
    fn test_missing_recipe_aborts() {
        let store = MemoryStore::new().with(
            Recipe::builder("app", version("0.1.0"))
                .requires(spec("ghost>=1.0.0"), false)
                .finish()
                .unwrap(),
        );

        let root = store.load("app", &"*".parse().unwrap()).unwrap();
        let err = GraphBuilder::new(&store)
            .build(root, &linux(), &OptionMap::new())
            .unwrap_err();
        assert_eq!(err.code(), "recipe.not_found");
    }
}
