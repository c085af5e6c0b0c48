//! Requirement rule evaluation
//!
//! Turns a recipe's conditional rules into the flat edge list the graph
//! builder consumes. Edges come out in rule-declaration order; that
//! order is the tie-break for force overrides, so it must be preserved.

use mason_types::{DepKind, OptionMap, PackageSpec, Settings};

use crate::condition::EvalContext;
use crate::recipe::Recipe;

/// One evaluated requirement of a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementEdge {
    pub spec: PackageSpec,
    pub force: bool,
    pub kind: DepKind,
}

impl RequirementEdge {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

/// Evaluate the runtime requirement rules of a recipe.
#[must_use]
pub fn evaluate_requirements(
    recipe: &Recipe,
    settings: &Settings,
    options: &OptionMap,
) -> Vec<RequirementEdge> {
    let ctx = EvalContext::new(settings, options);
    recipe
        .requirements()
        .iter()
        .filter(|rule| rule.when.eval(&ctx))
        .map(|rule| RequirementEdge {
            spec: rule.spec.clone(),
            force: rule.force,
            kind: DepKind::Runtime,
        })
        .collect()
}

/// Evaluate the tool requirement rules of a recipe.
///
/// Build requirements never enter the installable graph or the exposed
/// capabilities; they exist only for the build phase.
#[must_use]
pub fn evaluate_build_requirements(
    recipe: &Recipe,
    settings: &Settings,
    options: &OptionMap,
) -> Vec<RequirementEdge> {
    let ctx = EvalContext::new(settings, options);
    recipe
        .build_requirements()
        .iter()
        .filter(|rule| rule.when.eval(&ctx))
        .map(|rule| RequirementEdge {
            spec: rule.spec.clone(),
            force: rule.force,
            kind: DepKind::Build,
        })
        .collect()
}
