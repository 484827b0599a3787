//! The recipe aggregate: a recipe with its line items and tags, validated and
//! replaced as one unit.

use std::collections::HashSet;

use anyhow::anyhow;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::check_text;
use crate::error::{AppError, AppResult, ValidationErrors};
use crate::models::{
    media_url, LineItemView, Recipe, RecipeDetail, RecipeDraft, RecipeFilter, RecipeLineItem,
    RecipeList, ValidRecipe, MAX_AMOUNT, MAX_COOKING_TIME, MAX_RECIPE_NAME_LEN, MIN_AMOUNT,
    MIN_COOKING_TIME,
};
use crate::storage::Database;

/// The caller's relations, looked up once per request and shared by every
/// row of a listing.
#[derive(Debug, Default)]
pub struct Viewer {
    pub user_id: Option<Uuid>,
    pub favorites: HashSet<Uuid>,
    pub shopping_cart: HashSet<Uuid>,
    pub following: HashSet<Uuid>,
}

impl Viewer {
    pub fn follows(&self, user_id: Uuid) -> bool {
        self.following.contains(&user_id)
    }
}

impl Database {
    pub fn viewer(&self, user_id: Option<Uuid>) -> Viewer {
        let Some(id) = user_id else {
            return Viewer::default();
        };

        let recipes_in = |list: RecipeList| {
            self.links(list)
                .iter()
                .filter(|l| l.user_id == id)
                .map(|l| l.recipe_id)
                .collect()
        };

        Viewer {
            user_id: Some(id),
            favorites: recipes_in(RecipeList::Favorites),
            shopping_cart: recipes_in(RecipeList::ShoppingCart),
            following: self
                .follows
                .iter()
                .filter(|f| f.follower_id == id)
                .map(|f| f.followed_id)
                .collect(),
        }
    }

    /// Checks a draft against the catalogs. Every violated rule is reported.
    pub fn validate_recipe(&self, draft: RecipeDraft) -> AppResult<ValidRecipe> {
        let mut errors = ValidationErrors::default();

        check_text(&mut errors, "name", &draft.name, MAX_RECIPE_NAME_LEN);
        if draft.text.trim().is_empty() {
            errors.add("text", "This field may not be blank");
        }
        if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&draft.cooking_time) {
            errors.add(
                "cooking_time",
                format!("Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes"),
            );
        }
        if draft.image.trim().is_empty() {
            errors.add("image", "Add an image");
        }

        let line_items = self.validate_line_items(&draft, &mut errors);
        self.validate_tags(&draft, &mut errors);

        errors.into_result()?;

        Ok(ValidRecipe {
            name: draft.name.trim().to_string(),
            text: draft.text,
            cooking_time: u32::try_from(draft.cooking_time)
                .map_err(|_| AppError::invalid("cooking_time", "Cooking time is out of range"))?,
            image: draft.image,
            tags: draft.tags,
            line_items,
        })
    }

    fn validate_line_items(
        &self,
        draft: &RecipeDraft,
        errors: &mut ValidationErrors,
    ) -> Vec<RecipeLineItem> {
        if draft.ingredients.is_empty() {
            errors.add("ingredients", "Add at least one ingredient");
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut duplicated = false;
        let mut line_items = Vec::with_capacity(draft.ingredients.len());

        for item in &draft.ingredients {
            if !seen.insert(item.id) {
                duplicated = true;
            }
            if self.ingredient(item.id).is_none() {
                errors.add("ingredients", format!("Ingredient {} does not exist", item.id));
            }
            match u32::try_from(item.amount) {
                Ok(amount) if (MIN_AMOUNT..=MAX_AMOUNT).contains(&item.amount) => {
                    line_items.push(RecipeLineItem {
                        ingredient_id: item.id,
                        amount,
                    });
                }
                _ => errors.add(
                    "ingredients",
                    format!("Amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}"),
                ),
            }
        }

        if duplicated {
            errors.add("ingredients", "Ingredients can't repeat");
        }
        line_items
    }

    fn validate_tags(&self, draft: &RecipeDraft, errors: &mut ValidationErrors) {
        if draft.tags.is_empty() {
            errors.add("tags", "Add at least one tag");
            return;
        }

        let unique: HashSet<_> = draft.tags.iter().collect();
        if unique.len() != draft.tags.len() {
            errors.add("tags", "Tags can't repeat");
        }
        for id in &draft.tags {
            if self.tag(*id).is_none() {
                errors.add("tags", format!("Tag {id} does not exist"));
            }
        }
    }

    pub fn create_recipe(&mut self, author_id: Uuid, draft: RecipeDraft) -> AppResult<Recipe> {
        if self.user(author_id).is_none() {
            return Err(AppError::not_found("Author not found"));
        }

        let valid = self.validate_recipe(draft).inspect_err(|e| {
            debug!(author = %author_id, "recipe rejected: {e}");
        })?;

        let recipe = Recipe::new(author_id, valid);
        info!(id = %recipe.id, author = %author_id, "recipe created");
        self.recipes.push(recipe.clone());
        Ok(recipe)
    }

    /// Full replacement of fields, line items and tags. Only the author may
    /// edit, and authorship never changes.
    pub fn update_recipe(
        &mut self,
        editor_id: Uuid,
        recipe_id: Uuid,
        draft: RecipeDraft,
    ) -> AppResult<Recipe> {
        self.authorize_edit(editor_id, recipe_id)?;

        let valid = self.validate_recipe(draft).inspect_err(|e| {
            debug!(id = %recipe_id, "recipe update rejected: {e}");
        })?;

        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| r.id == recipe_id)
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;
        recipe.replace_with(valid);

        info!(id = %recipe_id, "recipe updated");
        Ok(recipe.clone())
    }

    /// Removes the recipe along with every favorite and cart entry for it.
    pub fn delete_recipe(&mut self, editor_id: Uuid, recipe_id: Uuid) -> AppResult<Recipe> {
        self.authorize_edit(editor_id, recipe_id)?;

        let index = self
            .recipes
            .iter()
            .position(|r| r.id == recipe_id)
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;
        let recipe = self.recipes.remove(index);

        self.favorites.retain(|l| l.recipe_id != recipe_id);
        self.shopping_cart.retain(|l| l.recipe_id != recipe_id);

        info!(id = %recipe_id, "recipe deleted");
        Ok(recipe)
    }

    fn authorize_edit(&self, editor_id: Uuid, recipe_id: Uuid) -> AppResult<()> {
        let recipe = self
            .recipe(recipe_id)
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;

        if recipe.author_id != editor_id {
            debug!(id = %recipe_id, editor = %editor_id, "edit by non-author refused");
            return Err(AppError::permission(
                "Only the author can change this recipe",
            ));
        }
        Ok(())
    }

    pub fn recipe_detail(&self, recipe: &Recipe, viewer: &Viewer) -> AppResult<RecipeDetail> {
        let author = self
            .user(recipe.author_id)
            .ok_or_else(|| anyhow!("author {} of recipe {} is missing", recipe.author_id, recipe.id))?;

        let ingredients = recipe
            .line_items
            .iter()
            .map(|line| {
                let ingredient = self.ingredient(line.ingredient_id).ok_or_else(|| {
                    anyhow!("ingredient {} of recipe {} is missing", line.ingredient_id, recipe.id)
                })?;
                Ok(LineItemView {
                    id: ingredient.id,
                    name: ingredient.name.clone(),
                    measurement_unit: ingredient.measurement_unit.clone(),
                    amount: line.amount,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let tags = recipe
            .tags
            .iter()
            .map(|id| {
                let tag = self
                    .tag(*id)
                    .ok_or_else(|| anyhow!("tag {id} of recipe {} is missing", recipe.id))?;
                Ok(tag.clone())
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(RecipeDetail {
            id: recipe.id,
            tags,
            author: author.view(viewer.follows(author.id)),
            ingredients,
            is_favorited: viewer.favorites.contains(&recipe.id),
            is_in_shopping_cart: viewer.shopping_cart.contains(&recipe.id),
            name: recipe.name.clone(),
            image: media_url(&recipe.image),
            text: recipe.text.clone(),
            cooking_time: recipe.cooking_time,
        })
    }

    pub fn get_recipe_detail(&self, recipe_id: Uuid, viewer: Option<Uuid>) -> AppResult<RecipeDetail> {
        let recipe = self
            .recipe(recipe_id)
            .ok_or_else(|| AppError::not_found("Recipe not found"))?;
        self.recipe_detail(recipe, &self.viewer(viewer))
    }

    /// Newest first. Tag slugs match any; relation filters are ignored for
    /// anonymous callers.
    pub fn list_recipes(
        &self,
        viewer: Option<Uuid>,
        filter: &RecipeFilter,
    ) -> AppResult<Vec<RecipeDetail>> {
        let viewer = self.viewer(viewer);
        let authenticated = viewer.user_id.is_some();
        let tag_ids = (!filter.tags.is_empty()).then(|| self.tag_ids_for_slugs(&filter.tags));

        let mut matching: Vec<&Recipe> = self
            .recipes
            .iter()
            .rev()
            .filter(|r| filter.author.map_or(true, |a| r.author_id == a))
            .filter(|r| {
                !(authenticated && filter.is_favorited) || viewer.favorites.contains(&r.id)
            })
            .filter(|r| {
                !(authenticated && filter.is_in_shopping_cart)
                    || viewer.shopping_cart.contains(&r.id)
            })
            .filter(|r| tag_ids.as_ref().map_or(true, |ids| r.has_any_tag(ids)))
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        matching
            .into_iter()
            .map(|r| self.recipe_detail(r, &viewer))
            .collect()
    }
}
