//! Per-package configurable options
//!
//! An option is a package-local parameter (shared/static, parallel, ...)
//! with a bounded value set declared by the recipe's schema. The resolver
//! turns schema + defaults + caller overrides into one effective map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single option value. Recipes declare booleans or bounded string
/// enumerations, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
}

impl OptionValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(_) => None,
        }
    }

    #[must_use]
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Allowed values per option name, as declared by a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSchema {
    allowed: BTreeMap<String, Vec<OptionValue>>,
}

impl OptionSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option with its allowed values, builder-style
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        allowed: impl IntoIterator<Item = OptionValue>,
    ) -> Self {
        self.allowed.insert(name.into(), allowed.into_iter().collect());
        self
    }

    /// Shorthand for the common `[true, false]` schema entry
    #[must_use]
    pub fn with_bool(self, name: impl Into<String>) -> Self {
        self.with(name, [OptionValue::Bool(true), OptionValue::Bool(false)])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.allowed.contains_key(name)
    }

    /// Check whether `value` is allowed for `name`. Unknown names allow
    /// nothing.
    #[must_use]
    pub fn allows(&self, name: &str, value: &OptionValue) -> bool {
        self.allowed
            .get(name)
            .is_some_and(|values| values.contains(value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.allowed.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Effective option assignment for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionMap {
    values: BTreeMap<String, OptionValue>,
}

impl OptionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True iff the option is present and set to boolean true.
    #[must_use]
    pub fn is_true(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(OptionValue::is_true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, OptionValue)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for OptionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self
            .values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
