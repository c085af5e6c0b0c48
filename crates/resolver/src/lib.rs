#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Dependency resolution for mason
//!
//! This crate turns a root recipe plus target settings into a resolved,
//! validated dependency graph: a deterministic worklist traversal with
//! diamond reconciliation and force overrides, cycle detection, a
//! batched execution plan, and the configuration validation gate.

mod builder;
mod execution;
mod graph;
mod validate;

pub use builder::GraphBuilder;
pub use execution::{ExecutionPlan, NodeMeta};
pub use graph::{EdgeRecord, ResolvedGraph, ResolvedNode};
pub use validate::{validate, ValidationFailure};
