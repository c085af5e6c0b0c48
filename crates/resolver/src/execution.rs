//! Execution plan for parallel lifecycle runs
//!
//! Batches are the orchestrator's dependency barrier: every package in
//! batch N depends only on packages in earlier batches, so one batch
//! can run concurrently while the next waits.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mason_errors::Error;

use crate::graph::ResolvedGraph;

/// Per-package scheduling metadata.
#[derive(Debug)]
pub struct NodeMeta {
    /// Number of dependencies not yet completed
    in_degree: AtomicUsize,
    /// Packages that depend on this one
    parents: Vec<String>,
}

impl NodeMeta {
    fn new(in_degree: usize, parents: Vec<String>) -> Self {
        Self {
            in_degree: AtomicUsize::new(in_degree),
            parents,
        }
    }

    /// Decrement in-degree and return the new value
    pub fn decrement_in_degree(&self) -> usize {
        self.in_degree
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1)
    }

    #[must_use]
    pub fn in_degree(&self) -> usize {
        self.in_degree.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn parents(&self) -> &[String] {
        &self.parents
    }
}

/// Batched topological execution order over a resolved graph.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    batches: Vec<Vec<String>>,
    metadata: HashMap<String, Arc<NodeMeta>>,
}

impl ExecutionPlan {
    /// Build the plan from a resolved graph.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::CyclicDependency` when the graph is not a
    /// DAG.
    pub fn from_graph(graph: &ResolvedGraph) -> Result<Self, Error> {
        // Fails on cycles before any batching happens.
        graph.topological_sort()?;

        let mut metadata = HashMap::new();
        for node in graph.nodes() {
            let parents: Vec<String> = graph
                .dependents_of(node.name())
                .into_iter()
                .map(ToString::to_string)
                .collect();
            metadata.insert(
                node.name().to_string(),
                Arc::new(NodeMeta::new(node.deps.len(), parents)),
            );
        }

        // Level-by-level batches; BTreeSet order keeps them stable.
        let mut remaining: BTreeSet<String> = graph
            .nodes()
            .map(|node| node.name().to_string())
            .collect();
        let mut done: HashSet<String> = HashSet::new();
        let mut batches = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<String> = remaining
                .iter()
                .filter(|name| {
                    graph
                        .dependencies_of(name)
                        .iter()
                        .all(|dep| done.contains(dep))
                })
                .cloned()
                .collect();

            if ready.is_empty() {
                // Unreachable with an acyclic graph.
                break;
            }

            for name in &ready {
                remaining.remove(name);
                done.insert(name.clone());
            }
            batches.push(ready);
        }

        Ok(Self { batches, metadata })
    }

    /// Execution batches in dependency order
    #[must_use]
    pub fn batches(&self) -> &[Vec<String>] {
        &self.batches
    }

    /// Scheduling metadata for a package
    #[must_use]
    pub fn metadata(&self, name: &str) -> Option<&Arc<NodeMeta>> {
        self.metadata.get(name)
    }

    /// Packages with no outstanding dependencies
    #[must_use]
    pub fn ready_packages(&self) -> Vec<String> {
        let mut ready: Vec<String> = self
            .metadata
            .iter()
            .filter(|(_, meta)| meta.in_degree() == 0)
            .map(|(name, _)| name.clone())
            .collect();
        ready.sort();
        ready
    }

    /// Mark a package as completed; returns packages that became ready.
    #[must_use]
    pub fn complete_package(&self, name: &str) -> Vec<String> {
        let Some(meta) = self.metadata.get(name) else {
            return Vec::new();
        };

        let mut newly_ready = Vec::new();
        for parent in meta.parents() {
            if let Some(parent_meta) = self.metadata.get(parent) {
                if parent_meta.decrement_in_degree() == 0 {
                    newly_ready.push(parent.clone());
                }
            }
        }
        newly_ready
    }

    #[must_use]
    pub fn package_count(&self) -> usize {
        self.metadata.len()
    }
}
