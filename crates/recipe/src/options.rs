//! Effective option resolution
//!
//! Resolution starts from the recipe's defaults, overlays caller
//! overrides, then applies the derived conventions the recipe opts
//! into. The result is the one option assignment every later stage
//! (requirement evaluation, validation, capability description) sees.

use mason_errors::{Error, RecipeError};
use mason_types::{OptionMap, Settings};

use crate::recipe::{Implements, Recipe};

/// Option name of the shared/static toggle
pub const SHARED: &str = "shared";
/// Option name of the position-independent-code flag
pub const FPIC: &str = "fPIC";

/// Compute the effective option set for a recipe under the given target
/// settings.
///
/// Resolution is idempotent: the same (recipe, settings, requested)
/// inputs always yield the same effective map.
///
/// # Errors
///
/// Returns `RecipeError::UnknownOption` for an override key the schema
/// does not declare and `RecipeError::InvalidOptionValue` for a value
/// outside the allowed set.
pub fn resolve_options(
    recipe: &Recipe,
    settings: &Settings,
    requested: &OptionMap,
) -> Result<OptionMap, Error> {
    let mut effective = recipe.default_options().clone();

    for (name, value) in requested.iter() {
        if !recipe.options().contains(name) {
            return Err(RecipeError::UnknownOption {
                package: recipe.name().to_string(),
                option: name.to_string(),
            }
            .into());
        }
        if !recipe.options().allows(name, value) {
            return Err(RecipeError::InvalidOptionValue {
                package: recipe.name().to_string(),
                option: name.to_string(),
                value: value.to_string(),
            }
            .into());
        }
        effective.insert(name.to_string(), value.clone());
    }

    for rule in recipe.implements() {
        apply_implements(*rule, settings, &mut effective);
    }

    Ok(effective)
}

fn apply_implements(rule: Implements, _settings: &Settings, options: &mut OptionMap) {
    match rule {
        Implements::AutoSharedFpic => {
            // fPIC is removed entirely rather than left at its default so
            // it cannot leak into downstream comparisons.
            if options.is_true(SHARED) {
                options.remove(FPIC);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mason_types::{settings, OptionValue, Version};

    fn recipe() -> Recipe {
        Recipe::builder("coin-cbc", Version::parse("2.10.12").unwrap())
            .settings([settings::OS, settings::ARCH])
            .bool_option(SHARED, false)
            .bool_option(FPIC, true)
            .option(
                "mode",
                [OptionValue::from("fast"), OptionValue::from("small")],
                "fast",
            )
            .implements(Implements::AutoSharedFpic)
            .finish()
            .unwrap()
    }

    fn linux() -> Settings {
        Settings::new().with(settings::OS, "linux")
    }

    #[test]
    fn test_defaults_apply() {
        let effective = resolve_options(&recipe(), &linux(), &OptionMap::new()).unwrap();
        assert!(!effective.is_true(SHARED));
        assert!(effective.is_true(FPIC));
        assert_eq!(effective.get("mode"), Some(&OptionValue::from("fast")));
    }

    #[test]
    fn test_override_applies() {
        let requested = OptionMap::new().with("mode", "small");
        let effective = resolve_options(&recipe(), &linux(), &requested).unwrap();
        assert_eq!(effective.get("mode"), Some(&OptionValue::from("small")));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let requested = OptionMap::new().with("lto", true);
        let err = resolve_options(&recipe(), &linux(), &requested).unwrap_err();
        assert_eq!(err.code(), "recipe.invalid_option");
    }

    #[test]
    fn test_invalid_value_rejected() {
        let requested = OptionMap::new().with("mode", "tiny");
        let err = resolve_options(&recipe(), &linux(), &requested).unwrap_err();
        assert_eq!(err.code(), "recipe.invalid_option");
    }

    #[test]
    fn test_shared_removes_fpic() {
        let requested = OptionMap::new().with(SHARED, true);
        let effective = resolve_options(&recipe(), &linux(), &requested).unwrap();
        assert!(effective.is_true(SHARED));
        assert!(!effective.contains(FPIC));
    }

    #[test]
    fn test_shared_false_keeps_fpic_at_default() {
        let requested = OptionMap::new().with(SHARED, false);
        let effective = resolve_options(&recipe(), &linux(), &requested).unwrap();
        assert!(effective.is_true(FPIC));

        let overridden = OptionMap::new().with(SHARED, false).with(FPIC, false);
        let effective = resolve_options(&recipe(), &linux(), &overridden).unwrap();
        assert_eq!(effective.get(FPIC), Some(&OptionValue::Bool(false)));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let requested = OptionMap::new().with(SHARED, true);
        let first = resolve_options(&recipe(), &linux(), &requested).unwrap();
        let second = resolve_options(&recipe(), &linux(), &requested).unwrap();
        assert_eq!(first, second);
        assert!(!second.contains(FPIC));
    }
}
