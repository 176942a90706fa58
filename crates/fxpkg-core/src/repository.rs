//! The set of recipes available for resolution.

use std::collections::BTreeMap;
use std::path::Path;

use fxpkg_util::errors::{FxError, FxResult};

use crate::recipe::Recipe;

/// Recipes compiled into the binary, as `(name, toml)`.
const BUILTIN: &[(&str, &str)] = &[
    ("fenics-basix", include_str!("../recipes/fenics-basix.toml")),
    ("fenics-dolfinx", include_str!("../recipes/fenics-dolfinx.toml")),
    ("py-fenics-dolfinx", include_str!("../recipes/py-fenics-dolfinx.toml")),
    ("py-fenics-ffcx", include_str!("../recipes/py-fenics-ffcx.toml")),
];

/// Immutable-after-load collection of recipes keyed by package name.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    recipes: BTreeMap<String, Recipe>,
}

impl Repository {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The recipes shipped with fxpkg.
    pub fn builtin() -> FxResult<Self> {
        let mut repo = Self::empty();
        for (name, content) in BUILTIN {
            let recipe = Recipe::parse_toml(content)?;
            if recipe.name != *name {
                return Err(FxError::Recipe {
                    message: format!("built-in recipe '{name}' declares name '{}'", recipe.name),
                });
            }
            repo.insert(recipe);
        }
        Ok(repo)
    }

    /// Load every `*.toml` recipe in `dir`, replacing same-named recipes.
    ///
    /// Returns the number of recipes loaded. A missing directory loads nothing.
    pub fn load_dir(&mut self, dir: &Path) -> FxResult<usize> {
        let files = fxpkg_util::fs::files_with_extension(dir, "toml")?;
        for path in &files {
            let recipe = crate::manifest::RecipeFile::from_path(path).and_then(Recipe::compile)?;
            tracing::debug!("loaded recipe {} from {}", recipe.name, path.display());
            if let Some(previous) = self.insert(recipe) {
                tracing::info!("{} overrides an earlier recipe", previous.name);
            }
        }
        Ok(files.len())
    }

    /// Add a recipe, returning the one it replaces.
    pub fn insert(&mut self, recipe: Recipe) -> Option<Recipe> {
        self.recipes.insert(recipe.name.clone(), recipe)
    }

    pub fn find(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    pub fn get(&self, name: &str) -> FxResult<&Recipe> {
        self.find(name).ok_or_else(|| FxError::UnknownPackage {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    /// Recipes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
