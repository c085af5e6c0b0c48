//! Consumption metadata exposed by a packaged node
//!
//! Capabilities describe what a built package offers its consumers:
//! library names, include directories, system libraries, and downstream
//! requirement names. Larger packages split this into named components
//! (e.g. a solver library and its OSI adapter) that consumers can depend
//! on individually.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One exposed component of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_dirs: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system_libraries: Vec<String>,

    /// Component references this component links against, either
    /// `"component"` within the same package or `"package::component"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Component {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_library(mut self, name: impl Into<String>) -> Self {
        self.libraries.push(name.into());
        self
    }

    #[must_use]
    pub fn with_include_dir(mut self, dir: impl Into<String>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_system_library(mut self, name: impl Into<String>) -> Self {
        self.system_libraries.push(name.into());
        self
    }

    #[must_use]
    pub fn with_requirement(mut self, target: impl Into<String>) -> Self {
        self.requires.push(target.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Static capability metadata declared by a recipe.
///
/// A package without explicit components exposes one default component
/// under its own name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities {
    components: BTreeMap<String, Component>,
}

impl Capabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_component(mut self, name: impl Into<String>, component: Component) -> Self {
        self.components.insert(name.into(), component);
        self
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn component_mut(&mut self, name: &str) -> &mut Component {
        self.components.entry(name.to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Component)> {
        self.components.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
