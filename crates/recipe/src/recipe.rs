//! Immutable package recipe model
//!
//! A recipe is the declarative description of one package: identity,
//! option schema, the settings it consumes, and ordered rule sets for
//! requirements, validation, and exposed capabilities. Recipes are built
//! once, checked, and never mutated afterwards.

use mason_errors::RecipeError;
use mason_types::{
    Capabilities, OptionMap, OptionSchema, OptionValue, PackageId, PackageSpec, Version,
};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// Derived option conventions a recipe opts into, applied after
/// defaults and caller overrides are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Implements {
    /// Remove `fPIC` from the effective set when `shared` is true;
    /// position-independent-code flags are meaningless for shared
    /// artifacts and must not leak into downstream comparisons.
    AutoSharedFpic,
}

/// One conditional requirement declaration.
///
/// Rule order is significant: it is the tie-break when several force
/// overrides target the same package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRule {
    #[serde(default = "default_condition")]
    pub when: Condition,
    pub spec: PackageSpec,
    #[serde(default)]
    pub force: bool,
}

/// A configuration the recipe refuses to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub reject_when: Condition,
    pub message: String,
}

/// Conditional additions to the exposed capabilities, evaluated against
/// the node's effective settings and options at description time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRule {
    pub when: Condition,
    /// Component the additions apply to
    pub component: String,
    #[serde(default)]
    pub system_libraries: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
}

fn default_condition() -> Condition {
    Condition::Always
}

/// Immutable declarative description of one package.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    name: String,
    version: Version,
    description: Option<String>,
    license: Option<String>,
    options: OptionSchema,
    default_options: OptionMap,
    settings_keys: Vec<String>,
    implements: Vec<Implements>,
    requirements: Vec<RequirementRule>,
    build_requirements: Vec<RequirementRule>,
    validations: Vec<ValidationRule>,
    capabilities: Capabilities,
    capability_rules: Vec<CapabilityRule>,
}

impl Recipe {
    /// Start building a recipe for the given package identity.
    pub fn builder(name: impl Into<String>, version: Version) -> RecipeBuilder {
        RecipeBuilder {
            recipe: Recipe {
                name: name.into(),
                version,
                description: None,
                license: None,
                options: OptionSchema::new(),
                default_options: OptionMap::new(),
                settings_keys: Vec::new(),
                implements: Vec::new(),
                requirements: Vec::new(),
                build_requirements: Vec::new(),
                validations: Vec::new(),
                capabilities: Capabilities::new(),
                capability_rules: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    #[must_use]
    pub fn package_id(&self) -> PackageId {
        PackageId::new(self.name.clone(), self.version.clone())
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> &OptionSchema {
        &self.options
    }

    #[must_use]
    pub fn default_options(&self) -> &OptionMap {
        &self.default_options
    }

    #[must_use]
    pub fn settings_keys(&self) -> &[String] {
        &self.settings_keys
    }

    #[must_use]
    pub fn implements(&self) -> &[Implements] {
        &self.implements
    }

    #[must_use]
    pub fn requirements(&self) -> &[RequirementRule] {
        &self.requirements
    }

    #[must_use]
    pub fn build_requirements(&self) -> &[RequirementRule] {
        &self.build_requirements
    }

    #[must_use]
    pub fn validations(&self) -> &[ValidationRule] {
        &self.validations
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[must_use]
    pub fn capability_rules(&self) -> &[CapabilityRule] {
        &self.capability_rules
    }
}

/// Builder enforcing recipe invariants at `finish`.
pub struct RecipeBuilder {
    recipe: Recipe,
}

impl RecipeBuilder {
    /// Free-form package description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.recipe.description = Some(description.into());
        self
    }

    /// SPDX license expression.
    #[must_use]
    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.recipe.license = Some(license.into());
        self
    }

    /// Declare an option with allowed values and a default.
    #[must_use]
    pub fn option(
        mut self,
        name: impl Into<String>,
        allowed: impl IntoIterator<Item = OptionValue>,
        default: impl Into<OptionValue>,
    ) -> Self {
        let name = name.into();
        self.recipe.options = self.recipe.options.with(name.clone(), allowed);
        self.recipe.default_options.insert(name, default);
        self
    }

    /// Declare a boolean option (`[true, false]`) with a default.
    #[must_use]
    pub fn bool_option(self, name: impl Into<String>, default: bool) -> Self {
        self.option(
            name,
            [OptionValue::Bool(true), OptionValue::Bool(false)],
            default,
        )
    }

    /// Declare the settings keys this recipe consumes.
    #[must_use]
    pub fn settings(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.recipe.settings_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Opt into a derived option convention.
    #[must_use]
    pub fn implements(mut self, rule: Implements) -> Self {
        self.recipe.implements.push(rule);
        self
    }

    /// Unconditional requirement.
    #[must_use]
    pub fn requires(self, spec: PackageSpec, force: bool) -> Self {
        self.requires_when(Condition::Always, spec, force)
    }

    /// Requirement active when the condition holds.
    #[must_use]
    pub fn requires_when(mut self, when: Condition, spec: PackageSpec, force: bool) -> Self {
        self.recipe.requirements.push(RequirementRule {
            when,
            spec,
            force,
        });
        self
    }

    /// Unconditional tool requirement (build phase only).
    #[must_use]
    pub fn build_requires(self, spec: PackageSpec) -> Self {
        self.build_requires_when(Condition::Always, spec)
    }

    /// Tool requirement active when the condition holds.
    #[must_use]
    pub fn build_requires_when(mut self, when: Condition, spec: PackageSpec) -> Self {
        self.recipe.build_requirements.push(RequirementRule {
            when,
            spec,
            force: false,
        });
        self
    }

    /// Reject the configuration when the condition holds.
    #[must_use]
    pub fn reject_when(mut self, condition: Condition, message: impl Into<String>) -> Self {
        self.recipe.validations.push(ValidationRule {
            reject_when: condition,
            message: message.into(),
        });
        self
    }

    /// Static capability metadata.
    #[must_use]
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.recipe.capabilities = capabilities;
        self
    }

    /// Conditional capability additions.
    #[must_use]
    pub fn capability_rule(mut self, rule: CapabilityRule) -> Self {
        self.recipe.capability_rules.push(rule);
        self
    }

    /// Check invariants and produce the immutable recipe.
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::SchemaMismatch` when option schema keys and
    /// default keys differ, or a default value is not allowed by the
    /// schema.
    pub fn finish(self) -> Result<Recipe, RecipeError> {
        let recipe = self.recipe;

        for name in recipe.options.names() {
            match recipe.default_options.get(name) {
                None => {
                    return Err(RecipeError::SchemaMismatch {
                        package: recipe.name.clone(),
                        message: format!("option '{name}' has no default"),
                    });
                }
                Some(default) if !recipe.options.allows(name, default) => {
                    return Err(RecipeError::SchemaMismatch {
                        package: recipe.name.clone(),
                        message: format!(
                            "default '{default}' for option '{name}' is not an allowed value"
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        for (name, _) in recipe.default_options.iter() {
            if !recipe.options.contains(name) {
                return Err(RecipeError::SchemaMismatch {
                    package: recipe.name.clone(),
                    message: format!("default for undeclared option '{name}'"),
                });
            }
        }

        Ok(recipe)
    }
}
