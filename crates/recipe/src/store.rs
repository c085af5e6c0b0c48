//! Recipe lookup and caching
//!
//! The engine loads recipes through the `RecipeStore` trait; where they
//! come from (an in-memory registry, a directory of recipe files, a
//! remote index) is the store's concern. For a given (name, constraint)
//! a store must behave as pure: same input, same recipe.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use mason_errors::{Error, RecipeError};
use mason_types::VersionSpec;

use crate::recipe::Recipe;

/// Supplies recipe definitions to the graph builder.
pub trait RecipeStore: Send + Sync {
    /// Load the best recipe matching the constraint.
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::NotFound` when no registered version
    /// satisfies the constraint.
    fn load(&self, name: &str, constraint: &VersionSpec) -> Result<Arc<Recipe>, Error>;
}

/// In-memory recipe registry.
///
/// Candidates are kept sorted by version so `load` picks the highest
/// matching version deterministically.
#[derive(Default)]
pub struct MemoryStore {
    recipes: BTreeMap<String, Vec<Arc<Recipe>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe.
    ///
    /// # Errors
    ///
    /// Returns `RecipeError::Duplicate` when the same name and version
    /// is already registered.
    pub fn register(&mut self, recipe: Recipe) -> Result<(), RecipeError> {
        let candidates = self.recipes.entry(recipe.name().to_string()).or_default();

        if candidates.iter().any(|r| r.version() == recipe.version()) {
            return Err(RecipeError::Duplicate {
                name: recipe.name().to_string(),
                version: recipe.version().to_string(),
            });
        }

        candidates.push(Arc::new(recipe));
        candidates.sort_by(|a, b| a.version().cmp(b.version()));
        Ok(())
    }

    /// Register a recipe, panicking on duplicates. Test convenience.
    pub fn with(mut self, recipe: Recipe) -> Self {
        self.register(recipe).expect("duplicate recipe");
        self
    }
}

impl RecipeStore for MemoryStore {
    fn load(&self, name: &str, constraint: &VersionSpec) -> Result<Arc<Recipe>, Error> {
        self.recipes
            .get(name)
            .into_iter()
            .flatten()
            .rev()
            .find(|recipe| constraint.matches(recipe.version()))
            .cloned()
            .ok_or_else(|| {
                RecipeError::NotFound {
                    name: name.to_string(),
                    constraint: constraint.to_string(),
                }
                .into()
            })
    }
}

/// Process-wide caching wrapper around any store.
///
/// Populated lazily on first load; entries are read-only afterwards and
/// safe for concurrent lookup. Invalidation happens only through an
/// explicit `clear`, never implicitly mid-resolution.
pub struct CachedStore<S> {
    inner: S,
    cache: DashMap<(String, String), Arc<Recipe>>,
}

impl<S: RecipeStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

impl<S: RecipeStore> RecipeStore for CachedStore<S> {
    fn load(&self, name: &str, constraint: &VersionSpec) -> Result<Arc<Recipe>, Error> {
        let key = (name.to_string(), constraint.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(&hit));
        }

        let recipe = self.inner.load(name, constraint)?;
        self.cache.insert(key, Arc::clone(&recipe));
        Ok(recipe)
    }
}
