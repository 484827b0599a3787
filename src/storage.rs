use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Ingredient, Recipe, RecipeList, Tag, UserRecipeLink};
use crate::user_models::{AuthToken, Follow, User};

/// Every table of the service. Domain operations are implemented on this
/// type in their own modules; `Storage` only adds locking and persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub users: Vec<User>,
    pub tokens: Vec<AuthToken>,
    pub ingredients: Vec<Ingredient>,
    pub tags: Vec<Tag>,
    pub recipes: Vec<Recipe>,
    pub favorites: Vec<UserRecipeLink>,
    pub shopping_cart: Vec<UserRecipeLink>,
    pub follows: Vec<Follow>,
}

impl Database {
    pub fn links(&self, list: RecipeList) -> &Vec<UserRecipeLink> {
        match list {
            RecipeList::Favorites => &self.favorites,
            RecipeList::ShoppingCart => &self.shopping_cart,
        }
    }

    pub fn links_mut(&mut self, list: RecipeList) -> &mut Vec<UserRecipeLink> {
        match list {
            RecipeList::Favorites => &mut self.favorites,
            RecipeList::ShoppingCart => &mut self.shopping_cart,
        }
    }

    /// Store-level constraints, checked before every commit.
    pub fn check_constraints(&self) -> AppResult<()> {
        unique(
            self.ingredients
                .iter()
                .map(|i| (i.name.as_str(), i.measurement_unit.as_str())),
            "ingredient (name, measurement_unit)",
        )?;
        unique(self.tags.iter().map(|t| t.name.as_str()), "tag name")?;
        unique(self.tags.iter().map(|t| t.color.as_str()), "tag color")?;
        unique(self.tags.iter().map(|t| t.slug.as_str()), "tag slug")?;
        unique(self.users.iter().map(|u| u.email.as_str()), "user email")?;
        unique(self.users.iter().map(|u| u.username.as_str()), "username")?;

        for recipe in &self.recipes {
            unique(
                recipe.line_items.iter().map(|l| l.ingredient_id),
                "recipe ingredient",
            )?;
            unique(recipe.tags.iter().copied(), "recipe tag")?;
        }

        unique(
            self.favorites.iter().map(|l| (l.user_id, l.recipe_id)),
            "favorite",
        )?;
        unique(
            self.shopping_cart.iter().map(|l| (l.user_id, l.recipe_id)),
            "shopping cart entry",
        )?;
        unique(
            self.follows.iter().map(|f| (f.follower_id, f.followed_id)),
            "follow",
        )?;

        if self.follows.iter().any(|f| f.follower_id == f.followed_id) {
            return Err(AppError::invalid("follow", "Users cannot follow themselves"));
        }

        Ok(())
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn recipe(&self, id: Uuid) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }
}

fn unique<T: Eq + std::hash::Hash>(
    items: impl IntoIterator<Item = T>,
    what: &str,
) -> AppResult<()> {
    let mut seen = HashSet::new();
    if items.into_iter().all(|item| seen.insert(item)) {
        Ok(())
    } else {
        Err(AppError::conflict(format!("Duplicate {what}")))
    }
}

pub struct Storage {
    db: RwLock<Database>,
    path: Option<PathBuf>,
}

impl Storage {
    /// Opens a file-backed store, loading the snapshot if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let db: Database = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file {}", path.display()))?;
            serde_json::from_str(&data).context("Failed to parse storage file")?
        } else {
            Database::default()
        };

        info!(
            path = %path.display(),
            users = db.users.len(),
            ingredients = db.ingredients.len(),
            tags = db.tags.len(),
            recipes = db.recipes.len(),
            "storage loaded"
        );

        Ok(Self {
            db: RwLock::new(db),
            path: Some(path),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            db: RwLock::new(Database::default()),
            path: None,
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Database> {
        self.db.read().await
    }

    /// Runs `f` against a working copy; the copy replaces the live state only
    /// if `f` succeeds, constraints hold and the snapshot is persisted.
    pub async fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Database) -> AppResult<T>,
    {
        let mut db = self.db.write().await;
        let mut working = Database::clone(&db);

        let value = f(&mut working)?;
        working.check_constraints()?;
        self.save_to_disk(&working)?;

        *db = working;
        Ok(value)
    }

    fn save_to_disk(&self, db: &Database) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(db).context("Failed to serialize storage")?;
        write_replacing(path, json.as_bytes()).map_err(|e| {
            error!("{e:#}");
            AppError::Internal(e)
        })
    }
}

/// The previous snapshot stays intact until the new one is fully written.
fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    let staging = staging_path(path);
    fs::write(&staging, contents)
        .with_context(|| format!("Failed to write storage file {}", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("Failed to replace storage file {}", path.display()))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
