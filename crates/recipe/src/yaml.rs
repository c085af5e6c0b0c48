//! Declarative YAML recipe format
//!
//! Recipes can be written as YAML files instead of being assembled in
//! code. The file model mirrors the builder API; parsing goes through
//! the same invariant checks as `RecipeBuilder::finish`.
//!
//! ```yaml
//! metadata:
//!   name: coin-cbc
//!   version: 2.10.12
//!   license: EPL-2.0
//!
//! settings: [os, arch, compiler, build_type]
//!
//! options:
//!   shared: { values: [true, false], default: false }
//!   fPIC: { values: [true, false], default: true }
//!
//! implements: [auto_shared_fpic]
//!
//! requirements:
//!   - require: coin-utils==2.11.10
//!     force: true
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mason_errors::{Error, RecipeError};
use mason_types::{Capabilities, OptionValue, PackageSpec, Version};

use crate::condition::Condition;
use crate::recipe::{CapabilityRule, Implements, Recipe, ValidationRule};

/// Package metadata block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// One option declaration: allowed values plus a default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionEntry {
    pub values: Vec<OptionValue>,
    pub default: OptionValue,
}

/// One requirement declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementEntry {
    /// Package spec string, e.g. `"coin-utils==2.11.10"`
    pub require: String,

    #[serde(default)]
    pub force: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
}

/// Complete YAML recipe structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeFile {
    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, OptionEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implements: Vec<Implements>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<RequirementEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_requirements: Vec<RequirementEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationRule>,

    #[serde(default, skip_serializing_if = "Capabilities::is_empty")]
    pub capabilities: Capabilities,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_rules: Vec<CapabilityRule>,
}

impl RecipeFile {
    /// Parse a YAML document into the file model.
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::ParseError` on malformed YAML.
    pub fn parse(input: &str) -> Result<Self, Error> {
        serde_yml::from_str(input).map_err(|e| {
            RecipeError::ParseError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Convert into a checked, immutable recipe.
    ///
    /// # Errors
    ///
    /// Returns parse errors for malformed versions or package specs and
    /// `RecipeError::SchemaMismatch` when option invariants fail.
    pub fn into_recipe(self) -> Result<Recipe, Error> {
        let version = Version::parse(&self.metadata.version).map_err(|e| {
            RecipeError::ParseError {
                message: format!("version '{}': {e}", self.metadata.version),
            }
        })?;

        let mut builder = Recipe::builder(self.metadata.name, version);

        if let Some(description) = self.metadata.description {
            builder = builder.description(description);
        }
        if let Some(license) = self.metadata.license {
            builder = builder.license(license);
        }

        builder = builder.settings(self.settings);

        for (name, entry) in self.options {
            builder = builder.option(name, entry.values, entry.default);
        }
        for rule in self.implements {
            builder = builder.implements(rule);
        }

        for entry in self.requirements {
            let spec = PackageSpec::parse(&entry.require)?;
            let when = entry.when.unwrap_or(Condition::Always);
            builder = builder.requires_when(when, spec, entry.force);
        }
        for entry in self.build_requirements {
            let spec = PackageSpec::parse(&entry.require)?;
            let when = entry.when.unwrap_or(Condition::Always);
            builder = builder.build_requires_when(when, spec);
        }

        for rule in self.validations {
            builder = builder.reject_when(rule.reject_when, rule.message);
        }

        builder = builder.capabilities(self.capabilities);
        for rule in self.capability_rules {
            builder = builder.capability_rule(rule);
        }

        Ok(builder.finish()?)
    }
}

/// Parse a YAML document directly into a recipe.
///
/// # Errors
///
/// See [`RecipeFile::parse`] and [`RecipeFile::into_recipe`].
pub fn parse_recipe(input: &str) -> Result<Recipe, Error> {
    RecipeFile::parse(input)?.into_recipe()
}
