//! Resolved dependency graph
//!
//! The graph is an index, not an object web: a name-keyed node map plus
//! an append-only edge log. Reconciliation replays the log instead of
//! walking live references, which keeps diamond resolution deterministic
//! and cycle-safe. An edge is *active* when its requirer still holds the
//! version that produced it; edges logged by a superseded recipe version
//! stay in the log but no longer shape the graph.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use mason_errors::{Error, ResolveError};
use mason_recipe::{GraphView, Recipe, RequirementEdge};
use mason_types::{DepKind, OptionMap, PackageId, Settings, Version, VersionSpec};

/// One resolved package. Exactly one node exists per package name in a
/// given resolution.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub recipe: Arc<Recipe>,
    pub version: Version,
    /// Effective options after resolution
    pub options: OptionMap,
    /// Subset of the global settings this recipe consumes
    pub settings: Settings,
    /// Runtime dependency names, discovery order
    pub deps: Vec<String>,
    /// Tool requirements; never part of the installable graph
    pub build_requires: Vec<RequirementEdge>,
}

impl ResolvedNode {
    #[must_use]
    pub fn name(&self) -> &str {
        self.recipe.name()
    }

    #[must_use]
    pub fn package_id(&self) -> PackageId {
        PackageId::new(self.recipe.name().to_string(), self.version.clone())
    }
}

/// One logged requirement edge.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    /// Discovery sequence number; total order over the whole resolution
    pub seq: usize,
    pub from: String,
    /// Version of the requirer when the edge was evaluated
    pub from_version: Version,
    pub to: String,
    pub constraint: VersionSpec,
    pub force: bool,
    pub kind: DepKind,
}

/// Immutable resolved graph handed to validation and the orchestrator.
#[derive(Debug, Clone)]
pub struct ResolvedGraph {
    root: String,
    nodes: BTreeMap<String, ResolvedNode>,
    edge_log: Vec<EdgeRecord>,
}

impl ResolvedGraph {
    pub(crate) fn new(
        root: String,
        nodes: BTreeMap<String, ResolvedNode>,
        edge_log: Vec<EdgeRecord>,
    ) -> Self {
        Self {
            root,
            nodes,
            edge_log,
        }
    }

    #[must_use]
    pub fn root(&self) -> &ResolvedNode {
        &self.nodes[&self.root]
    }

    #[must_use]
    pub fn root_name(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolvedNode> {
        self.nodes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Chosen version of a package, if it is part of the graph
    #[must_use]
    pub fn version_of(&self, name: &str) -> Option<&Version> {
        self.nodes.get(name).map(|node| &node.version)
    }

    /// Nodes in name order
    pub fn nodes(&self) -> impl Iterator<Item = &ResolvedNode> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Full discovery log, including superseded edges
    #[must_use]
    pub fn edge_log(&self) -> &[EdgeRecord] {
        &self.edge_log
    }

    /// Runtime dependency names of a node
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes.get(name).map_or(&[], |node| &node.deps)
    }

    /// Names of nodes that directly require `name` at runtime
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|node| node.deps.iter().any(|dep| dep == name))
            .map(ResolvedNode::name)
            .collect()
    }

    /// All nodes that depend on `name`, directly or transitively.
    #[must_use]
    pub fn transitive_dependents_of(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents_of(current) {
                if seen.insert(dependent.to_string()) {
                    out.push(dependent.to_string());
                    queue.push_back(dependent);
                }
            }
        }

        out.sort();
        out
    }

    /// Find a dependency cycle, if any, as the path of names closing it.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let mut on_path = HashSet::new();

        // Deterministic: nodes are visited in name order, the root first.
        let mut order: Vec<&str> = vec![&self.root];
        order.extend(self.nodes.keys().map(String::as_str));

        for start in order {
            if !visited.contains(start) {
                if let Some(cycle) =
                    self.cycle_from(start, &mut visited, &mut path, &mut on_path)
                {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn cycle_from(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
        on_path: &mut HashSet<String>,
    ) -> Option<Vec<String>> {
        visited.insert(name.to_string());
        path.push(name.to_string());
        on_path.insert(name.to_string());

        for dep in self.dependencies_of(name) {
            if on_path.contains(dep) {
                // Close the loop: from the first occurrence of dep to here.
                let start = path.iter().position(|n| n == dep).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].to_vec();
                cycle.push(dep.clone());
                return Some(cycle);
            }
            if !visited.contains(dep.as_str()) {
                if let Some(cycle) = self.cycle_from(dep, visited, path, on_path) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        on_path.remove(name);
        None
    }

    /// Topological order over runtime dependencies (dependencies first).
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::CyclicDependency` when the graph is not a
    /// DAG.
    pub fn topological_sort(&self) -> Result<Vec<String>, Error> {
        if let Some(cycle) = self.find_cycle() {
            return Err(ResolveError::CyclicDependency { cycle }.into());
        }

        let mut in_degree: BTreeMap<&str, usize> = self
            .nodes
            .keys()
            .map(|name| (name.as_str(), self.dependencies_of(name).len()))
            .collect();

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut result = Vec::new();
        while let Some(name) = queue.pop_front() {
            result.push(name.to_string());

            for dependent in self.dependents_of(name) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            return Err(ResolveError::NotADag.into());
        }
        Ok(result)
    }

    /// Stable textual digest of the resolution: node versions, options,
    /// and the active edge relation. Two identical inputs must produce
    /// byte-identical fingerprints.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for node in self.nodes.values() {
            out.push_str(&format!(
                "{}/{} [{}] -> [{}]\n",
                node.name(),
                node.version,
                node.options,
                node.deps.join(", "),
            ));
        }
        out
    }
}

impl GraphView for ResolvedGraph {
    fn contains(&self, name: &str) -> bool {
        ResolvedGraph::contains(self, name)
    }

    fn version_of(&self, name: &str) -> Option<&Version> {
        ResolvedGraph::version_of(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, version: &str, deps: &[&str]) -> ResolvedNode {
        let recipe = Recipe::builder(name, Version::parse(version).unwrap())
            .finish()
            .unwrap();
        ResolvedNode {
            recipe: Arc::new(recipe),
            version: Version::parse(version).unwrap(),
            options: OptionMap::new(),
            settings: Settings::new(),
            deps: deps.iter().map(ToString::to_string).collect(),
            build_requires: Vec::new(),
        }
    }

    fn graph(root: &str, nodes: Vec<ResolvedNode>) -> ResolvedGraph {
        let map = nodes
            .into_iter()
            .map(|n| (n.name().to_string(), n))
            .collect();
        ResolvedGraph::new(root.to_string(), map, Vec::new())
    }

    #[test]
    fn test_topological_sort_dependencies_first() {
        let g = graph(
            "app",
            vec![
                node("app", "1.0.0", &["libb", "libc"]),
                node("libb", "1.0.0", &["libc"]),
                node("libc", "1.0.0", &[]),
            ],
        );

        let sorted = g.topological_sort().unwrap();
        let pos = |n: &str| sorted.iter().position(|x| x == n).unwrap();
        assert!(pos("libc") < pos("libb"));
        assert!(pos("libb") < pos("app"));
    }

    #[test]
    fn test_cycle_detection_names_members() {
        let g = graph(
            "a",
            vec![node("a", "1.0.0", &["b"]), node("b", "1.0.0", &["a"])],
        );

        let cycle = g.find_cycle().unwrap();
        assert!(cycle.contains(&"a".to_string()));
        assert!(cycle.contains(&"b".to_string()));

        let err = g.topological_sort().unwrap_err();
        assert_eq!(err.code(), "resolve.cyclic_dependency");
    }

    #[test]
    fn test_transitive_dependents() {
        let g = graph(
            "app",
            vec![
                node("app", "1.0.0", &["mid"]),
                node("mid", "1.0.0", &["leaf"]),
                node("leaf", "1.0.0", &[]),
                node("other", "1.0.0", &[]),
            ],
        );

        assert_eq!(
            g.transitive_dependents_of("leaf"),
            vec!["app".to_string(), "mid".to_string()]
        );
        assert!(g.transitive_dependents_of("app").is_empty());
    }

    #[test]
    fn test_graph_view() {
        let g = graph("app", vec![node("app", "1.2.3", &[])]);
        assert!(g.contains("app"));
        assert!(!g.contains("zlib"));
        assert_eq!(
            g.version_of("app"),
            Some(&Version::parse("1.2.3").unwrap())
        );
    }
}
