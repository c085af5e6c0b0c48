//! Configuration validation gate
//!
//! Every node's validation rules run against the *final* graph, not
//! per-edge: some rules depend on transitive choices, so validation
//! must see the whole resolution. All failures are collected so a
//! caller can report every problem in one pass.

use serde::{Deserialize, Serialize};

use mason_recipe::EvalContext;
use mason_types::Settings;

use crate::graph::ResolvedGraph;

/// One rejected configuration, attributed to the recipe that declared
/// the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub package: String,
    pub message: String,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.package, self.message)
    }
}

/// Run every node's validation rules against the resolved graph.
///
/// An empty result means the configuration is buildable. Rules see the
/// full root settings rather than the node's projection, since a rule
/// may reference settings its recipe does not otherwise consume.
#[must_use]
pub fn validate(graph: &ResolvedGraph, settings: &Settings) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    for node in graph.nodes() {
        let ctx = EvalContext::new(settings, &node.options).with_graph(graph);
        for rule in node.recipe.validations() {
            if rule.reject_when.eval(&ctx) {
                failures.push(ValidationFailure {
                    package: node.name().to_string(),
                    message: rule.message.clone(),
                });
            }
        }
    }

    failures
}
