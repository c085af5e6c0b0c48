//! Capability descriptor emission
//!
//! At the final phase every packaged node emits a machine-readable
//! record of what it offers consumers. Downstream nodes read these
//! during their generate phase; external build-file generators read
//! them as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mason_recipe::EvalContext;
use mason_resolver::ResolvedNode;
use mason_types::{Capabilities, PackageId};

/// Machine-readable consumption record for one packaged node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub package: PackageId,

    /// Flattened library names across all components, component order
    pub libraries: Vec<String>,

    pub include_dirs: Vec<String>,

    pub system_libraries: Vec<String>,

    /// Names of runtime dependencies; build requirements never appear
    pub requires: Vec<String>,

    /// Merged component properties; on a key collision the later
    /// component (name order) wins
    pub named_properties: BTreeMap<String, String>,

    /// Per-component detail for consumers that link selectively
    #[serde(default, skip_serializing_if = "Capabilities::is_empty")]
    pub components: Capabilities,
}

impl CapabilityDescriptor {
    /// Serialize to the JSON form external generators consume.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build the descriptor for a packaged node.
///
/// Conditional capability rules are evaluated against the node's
/// effective settings and options; matching rules extend the named
/// component before flattening.
#[must_use]
pub fn describe(node: &ResolvedNode) -> CapabilityDescriptor {
    let ctx = EvalContext::new(&node.settings, &node.options);

    // Start from the static capabilities and fold in matching rules.
    let mut components = node.recipe.capabilities().clone();
    for rule in node.recipe.capability_rules() {
        if rule.when.eval(&ctx) {
            let component = components.component_mut(&rule.component);
            component
                .system_libraries
                .extend(rule.system_libraries.iter().cloned());
            component.requires.extend(rule.requires.iter().cloned());
        }
    }

    let mut libraries = Vec::new();
    let mut include_dirs = Vec::new();
    let mut system_libraries = Vec::new();
    let mut named_properties = BTreeMap::new();

    for (_, component) in components.iter() {
        libraries.extend(component.libraries.iter().cloned());
        extend_unique(&mut include_dirs, &component.include_dirs);
        extend_unique(&mut system_libraries, &component.system_libraries);
        for (key, value) in &component.properties {
            named_properties.insert(key.clone(), value.clone());
        }
    }

    CapabilityDescriptor {
        package: node.package_id(),
        libraries,
        include_dirs,
        system_libraries,
        requires: node.deps.clone(),
        named_properties,
        components,
    }
}

fn extend_unique(target: &mut Vec<String>, source: &[String]) {
    for item in source {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
