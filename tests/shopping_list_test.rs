#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{draft, ingredient, user, Kitchen};
use foodgram::models::{RecipeList, ShoppingListItem};
use foodgram::shopping_list::{render_shopping_list, SHOPPING_LIST_HEADER};

fn item(name: &str, amount: u64, unit: &str) -> ShoppingListItem {
    ShoppingListItem {
        name: name.to_string(),
        amount,
        measurement_unit: unit.to_string(),
    }
}

#[test]
fn test_sums_across_cart_recipes() {
    let mut k = Kitchen::new();
    let a = k.recipe("A", &[(k.salt, 10)]);
    let b = k.recipe("B", &[(k.salt, 5), (k.sugar, 20)]);
    k.db.add_to_list(RecipeList::ShoppingCart, k.chef, a).unwrap();
    k.db.add_to_list(RecipeList::ShoppingCart, k.chef, b).unwrap();

    assert_eq!(
        k.db.shopping_list(k.chef),
        vec![item("Salt", 15, "g"), item("Sugar", 20, "g")]
    );
}

#[test]
fn test_empty_cart_is_empty_list() {
    let mut k = Kitchen::new();
    k.recipe("A", &[(k.salt, 10)]);
    assert!(k.db.shopping_list(k.chef).is_empty());
}

#[test]
fn test_only_own_cart_and_not_favorites() {
    let mut k = Kitchen::new();
    let other = user(&mut k.db, "other");
    let a = k.recipe("A", &[(k.salt, 10)]);
    let b = k.recipe("B", &[(k.flour, 200)]);
    k.db.add_to_list(RecipeList::ShoppingCart, other, a).unwrap();
    k.db.add_to_list(RecipeList::Favorites, k.chef, a).unwrap();
    k.db.add_to_list(RecipeList::ShoppingCart, k.chef, b).unwrap();

    assert_eq!(k.db.shopping_list(k.chef), vec![item("Flour", 200, "g")]);
    assert_eq!(k.db.shopping_list(other), vec![item("Salt", 10, "g")]);
}

#[test]
fn test_groups_by_name_and_unit() {
    let mut k = Kitchen::new();
    let salt_tsp = ingredient(&mut k.db, "Salt", "tsp");
    let a = k.recipe("A", &[(k.salt, 10), (salt_tsp, 2)]);
    let b = k.recipe("B", &[(salt_tsp, 1)]);
    k.db.add_to_list(RecipeList::ShoppingCart, k.chef, a).unwrap();
    k.db.add_to_list(RecipeList::ShoppingCart, k.chef, b).unwrap();

    assert_eq!(
        k.db.shopping_list(k.chef),
        vec![item("Salt", 10, "g"), item("Salt", 3, "tsp")]
    );
}

#[test]
fn test_idempotent_and_tracks_amount_changes() {
    let mut k = Kitchen::new();
    let a = k.recipe("A", &[(k.salt, 2), (k.sugar, 7)]);
    let b = k.recipe("B", &[(k.salt, 4)]);
    k.db.add_to_list(RecipeList::ShoppingCart, k.chef, a).unwrap();
    k.db.add_to_list(RecipeList::ShoppingCart, k.chef, b).unwrap();

    let before = k.db.shopping_list(k.chef);
    assert_eq!(before, k.db.shopping_list(k.chef));
    assert_eq!(before, vec![item("Salt", 6, "g"), item("Sugar", 7, "g")]);

    k.db
        .update_recipe(
            k.chef,
            a,
            draft("A", &[k.lunch], &[(k.salt, 5), (k.sugar, 7)]),
        )
        .unwrap();

    let after = k.db.shopping_list(k.chef);
    assert_eq!(after, vec![item("Salt", 9, "g"), item("Sugar", 7, "g")]);
}

#[test]
fn test_rendered_file() {
    let mut k = Kitchen::new();
    let a = k.recipe("A", &[(k.sugar, 20), (k.salt, 15)]);
    k.db.add_to_list(RecipeList::ShoppingCart, k.chef, a).unwrap();

    let text = render_shopping_list(&k.db.shopping_list(k.chef));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], SHOPPING_LIST_HEADER);
    assert_eq!(lines[1], "");
    assert_eq!(lines[2..].to_vec(), vec!["Salt --> 15 (g)", "Sugar --> 20 (g)"]);
}
