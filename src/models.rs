use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user_models::UserView;

pub const MAX_INGREDIENT_NAME_LEN: usize = 200;
pub const MAX_MEASUREMENT_UNIT_LEN: usize = 150;
pub const MAX_TAG_FIELD_LEN: usize = 150;
pub const MAX_SLUG_LEN: usize = 50;
pub const MAX_RECIPE_NAME_LEN: usize = 150;
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 10_000;
pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

impl Ingredient {
    pub fn new(name: String, measurement_unit: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            measurement_unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl Tag {
    pub fn new(name: String, color: String, slug: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            color,
            slug,
        }
    }
}

/// One ingredient quantity inside a recipe. The owning recipe is implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLineItem {
    pub ingredient_id: Uuid,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    /// Asset store reference, relative to the media root.
    pub image: String,
    pub text: String,
    pub cooking_time: u32,
    pub line_items: Vec<RecipeLineItem>,
    pub tags: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(author_id: Uuid, draft: ValidRecipe) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            name: draft.name,
            image: draft.image,
            text: draft.text,
            cooking_time: draft.cooking_time,
            line_items: draft.line_items,
            tags: draft.tags,
            created_at: Utc::now(),
        }
    }

    /// Replaces every mutable field. Author, id and creation time stay.
    pub fn replace_with(&mut self, draft: ValidRecipe) {
        self.name = draft.name;
        self.image = draft.image;
        self.text = draft.text;
        self.cooking_time = draft.cooking_time;
        self.line_items = draft.line_items;
        self.tags = draft.tags;
    }

    pub fn has_any_tag(&self, tag_ids: &[Uuid]) -> bool {
        self.tags.iter().any(|t| tag_ids.contains(t))
    }
}

/// A favorite or shopping cart entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecipeLink {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl UserRecipeLink {
    pub fn new(user_id: Uuid, recipe_id: Uuid) -> Self {
        Self {
            user_id,
            recipe_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    pub fn label(self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping cart",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub id: Uuid,
    pub amount: i64,
}

/// Unvalidated recipe fields as decoded by the serving layer.
#[derive(Debug, Clone, Default)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<LineItemInput>,
}

/// Recipe fields that passed validation against the catalogs.
#[derive(Debug, Clone)]
pub struct ValidRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: u32,
    pub image: String,
    pub tags: Vec<Uuid>,
    pub line_items: Vec<RecipeLineItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    /// Base64 data URI. Optional on update, where the stored image is kept.
    pub image: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<LineItemInput>,
}

impl RecipePayload {
    pub fn into_draft(self, image: String) -> RecipeDraft {
        RecipeDraft {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image,
            tags: self.tags,
            ingredients: self.ingredients,
        }
    }
}

/// Read-path filter. Relation flags only apply to authenticated callers.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineItemView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<LineItemView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeMinified {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: u32,
}

impl From<&Recipe> for RecipeMinified {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: media_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub amount: u64,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Cuts one page out of a fully ordered list. Pages are 1-based.
    pub fn paginate(items: Vec<T>, page: usize, limit: usize) -> Self {
        let count = items.len();
        let skip = page.saturating_sub(1).saturating_mul(limit);
        let results = items.into_iter().skip(skip).take(limit).collect();
        Self { count, results }
    }
}

/// Public URL of a stored asset.
pub fn media_url(asset: &str) -> String {
    format!("/media/{asset}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginates_one_based() {
        let page = Page::paginate((1..=10).collect::<Vec<_>>(), 2, 3);
        assert_eq!(page.count, 10);
        assert_eq!(page.results, vec![4, 5, 6]);

        let past_end = Page::paginate((1..=10).collect::<Vec<_>>(), 5, 3);
        assert!(past_end.results.is_empty());

        let zero = Page::paginate(vec![1, 2], 0, 5);
        assert_eq!(zero.results, vec![1, 2]);
    }
}
