#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package recipe model for mason
//!
//! A recipe is the declarative description of one package: its option
//! schema, the target settings it consumes, and ordered rule sets for
//! conditional requirements, validation, and exposed capabilities.
//! This crate also provides option resolution, requirement evaluation,
//! the YAML recipe format, and recipe stores.

pub mod condition;
pub mod options;
pub mod recipe;
pub mod requirements;
pub mod store;
pub mod yaml;

pub use condition::{Condition, EvalContext, GraphView};
pub use options::{resolve_options, FPIC, SHARED};
pub use recipe::{
    CapabilityRule, Implements, Recipe, RecipeBuilder, RequirementRule, ValidationRule,
};
pub use requirements::{
    evaluate_build_requirements, evaluate_requirements, RequirementEdge,
};
pub use store::{CachedStore, MemoryStore, RecipeStore};
pub use yaml::{parse_recipe, RecipeFile};
