//! Recipe loading and option resolution error types

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RecipeError {
    #[error("recipe not found: {name} ({constraint})")]
    NotFound { name: String, constraint: String },

    #[error("unknown option '{option}' for package {package}")]
    UnknownOption { package: String, option: String },

    #[error("invalid value '{value}' for option '{option}' of package {package}")]
    InvalidOptionValue {
        package: String,
        option: String,
        value: String,
    },

    #[error("option schema mismatch for package {package}: {message}")]
    SchemaMismatch { package: String, message: String },

    #[error("recipe parse error: {message}")]
    ParseError { message: String },

    #[error("duplicate recipe registered: {name}-{version}")]
    Duplicate { name: String, version: String },
}

impl RecipeError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            RecipeError::NotFound { .. } => "recipe.not_found",
            RecipeError::UnknownOption { .. } | RecipeError::InvalidOptionValue { .. } => {
                "recipe.invalid_option"
            }
            RecipeError::SchemaMismatch { .. } => "recipe.schema_mismatch",
            RecipeError::ParseError { .. } => "recipe.parse_error",
            RecipeError::Duplicate { .. } => "recipe.duplicate",
        }
    }
}
