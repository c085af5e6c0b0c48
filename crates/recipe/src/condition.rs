//! Predicate expressions over settings, options, and the resolved graph
//!
//! Requirement and validation rules carry conditions as data rather than
//! code: each named package stays a plain value, and rules can be
//! serialized, compared, and re-evaluated without side effects.

use mason_types::{OptionMap, OptionValue, Settings, Version};
use serde::{Deserialize, Serialize};

/// Read-only view of a resolved dependency graph.
///
/// Defined here so graph-aware conditions can be evaluated without a
/// dependency on the resolver crate; the resolver's graph implements it.
pub trait GraphView {
    /// Whether a package with this name is part of the graph
    fn contains(&self, name: &str) -> bool;

    /// Chosen version of a package, if present
    fn version_of(&self, name: &str) -> Option<&Version>;
}

/// Evaluation inputs for a condition.
///
/// `graph` is only available during validation; requirement rules are
/// evaluated before the graph exists and see `None`.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub settings: &'a Settings,
    pub options: &'a OptionMap,
    pub graph: Option<&'a dyn GraphView>,
}

impl<'a> EvalContext<'a> {
    #[must_use]
    pub fn new(settings: &'a Settings, options: &'a OptionMap) -> Self {
        Self {
            settings,
            options,
            graph: None,
        }
    }

    #[must_use]
    pub fn with_graph(mut self, graph: &'a dyn GraphView) -> Self {
        self.graph = Some(graph);
        self
    }
}

/// A pure predicate over the evaluation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Unconditionally true
    Always,

    /// The setting is present and equals the value
    SettingEquals { setting: String, value: String },

    /// The setting is present and equals one of the values
    SettingIn {
        setting: String,
        values: Vec<String>,
    },

    /// The option is present and equals the value
    OptionEquals {
        option: String,
        value: OptionValue,
    },

    /// The option is present and boolean true
    OptionTrue { option: String },

    /// The resolved graph contains the named package. Always false while
    /// requirements are being evaluated (no graph exists yet).
    DependsOn { package: String },

    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    /// Evaluate against the context. Pure: no side effects, stable across
    /// repeated evaluation with the same inputs.
    #[must_use]
    pub fn eval(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::SettingEquals { setting, value } => ctx.settings.is(setting, value),
            Condition::SettingIn { setting, values } => ctx
                .settings
                .get(setting)
                .is_some_and(|actual| values.iter().any(|v| v == actual)),
            Condition::OptionEquals { option, value } => {
                ctx.options.get(option) == Some(value)
            }
            Condition::OptionTrue { option } => ctx.options.is_true(option),
            Condition::DependsOn { package } => {
                ctx.graph.is_some_and(|graph| graph.contains(package))
            }
            Condition::Not(inner) => !inner.eval(ctx),
            Condition::All(inner) => inner.iter().all(|c| c.eval(ctx)),
            Condition::Any(inner) => inner.iter().any(|c| c.eval(ctx)),
        }
    }

    // Convenience constructors keep rule declarations readable.

    pub fn setting_equals(setting: impl Into<String>, value: impl Into<String>) -> Self {
        Self::SettingEquals {
            setting: setting.into(),
            value: value.into(),
        }
    }

    pub fn setting_in(
        setting: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::SettingIn {
            setting: setting.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn option_true(option: impl Into<String>) -> Self {
        Self::OptionTrue {
            option: option.into(),
        }
    }

    pub fn option_equals(option: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Self::OptionEquals {
            option: option.into(),
            value: value.into(),
        }
    }

    pub fn depends_on(package: impl Into<String>) -> Self {
        Self::DependsOn {
            package: package.into(),
        }
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Condition::All(mut inner) => {
                inner.push(other);
                Condition::All(inner)
            }
            first => Condition::All(vec![first, other]),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }
}
