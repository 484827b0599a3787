//! Favorites and shopping cart: unique (user, recipe) memberships.

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{RecipeList, RecipeMinified, UserRecipeLink};
use crate::storage::Database;

impl Database {
    pub fn contains_link(&self, list: RecipeList, user_id: Uuid, recipe_id: Uuid) -> bool {
        self.links(list)
            .iter()
            .any(|l| l.user_id == user_id && l.recipe_id == recipe_id)
    }

    pub fn add_to_list(
        &mut self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> AppResult<RecipeMinified> {
        let recipe = self
            .recipe(recipe_id)
            .map(RecipeMinified::from)
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;

        if self.contains_link(list, user_id, recipe_id) {
            debug!(user = %user_id, recipe = %recipe_id, "already in {}", list.label());
            return Err(AppError::conflict(format!(
                "Recipe is already in {}",
                list.label()
            )));
        }

        self.links_mut(list)
            .push(UserRecipeLink::new(user_id, recipe_id));
        info!(user = %user_id, recipe = %recipe_id, "added to {}", list.label());
        Ok(recipe)
    }

    /// Removing an absent membership is an error, not a no-op.
    pub fn remove_from_list(
        &mut self,
        list: RecipeList,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> AppResult<()> {
        if self.recipe(recipe_id).is_none() {
            return Err(AppError::not_found("Recipe not found"));
        }

        let links = self.links_mut(list);
        let before = links.len();
        links.retain(|l| !(l.user_id == user_id && l.recipe_id == recipe_id));

        if links.len() == before {
            return Err(AppError::not_found(format!(
                "Recipe is not in {}",
                list.label()
            )));
        }

        info!(user = %user_id, recipe = %recipe_id, "removed from {}", list.label());
        Ok(())
    }
}
