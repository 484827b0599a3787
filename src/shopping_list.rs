//! Folds every recipe in a user's cart into one ingredient list.

use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use crate::models::{RecipeList, ShoppingListItem};
use crate::storage::Database;

pub const SHOPPING_LIST_HEADER: &str =
    "Your list of ingredients for cooking every recipe in the shopping cart.";

impl Database {
    /// Totals per (name, unit), ordered by name. An empty cart gives an
    /// empty list.
    pub fn shopping_list(&self, user_id: Uuid) -> Vec<ShoppingListItem> {
        let in_cart: HashSet<Uuid> = self
            .links(RecipeList::ShoppingCart)
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.recipe_id)
            .collect();

        let mut totals: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        for recipe in self.recipes.iter().filter(|r| in_cart.contains(&r.id)) {
            for line in &recipe.line_items {
                let Some(ingredient) = self.ingredient(line.ingredient_id) else {
                    continue;
                };
                *totals
                    .entry((ingredient.name.as_str(), ingredient.measurement_unit.as_str()))
                    .or_default() += u64::from(line.amount);
            }
        }

        totals
            .into_iter()
            .map(|((name, unit), amount)| ShoppingListItem {
                name: name.to_string(),
                amount,
                measurement_unit: unit.to_string(),
            })
            .collect()
    }
}

/// Plain-text download: header, blank line, then `name --> total (unit)`.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|i| format!("{} --> {} ({})", i.name, i.amount, i.measurement_unit))
        .collect();

    format!("{SHOPPING_LIST_HEADER}\n\n{}", lines.join("\n"))
}

pub fn shopping_list_filename(username: &str) -> String {
    format!("{username}_shopping_list_ingredients.txt")
}
