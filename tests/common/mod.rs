#![allow(dead_code)]

use foodgram::models::{LineItemInput, RecipeDraft};
use foodgram::storage::Database;
use foodgram::user_models::NewUser;
use uuid::Uuid;

pub fn new_user(username: &str) -> NewUser {
    NewUser {
        email: format!("{username}@example.com"),
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password: "password".to_string(),
    }
}

pub fn user(db: &mut Database, username: &str) -> Uuid {
    db.register_user(new_user(username), "not-a-real-hash".to_string())
        .unwrap()
        .id
}

pub fn ingredient(db: &mut Database, name: &str, unit: &str) -> Uuid {
    db.get_or_create_ingredient(name, unit).unwrap().0.id
}

pub fn tag(db: &mut Database, slug: &str) -> Uuid {
    let color = format!("#{:06x}", db.tags.len() * 1111 + 1);
    db.get_or_create_tag(&slug.to_uppercase(), &color, slug)
        .unwrap()
        .0
        .id
}

pub fn draft(name: &str, tags: &[Uuid], items: &[(Uuid, i64)]) -> RecipeDraft {
    RecipeDraft {
        name: name.to_string(),
        text: format!("How to cook {name}"),
        cooking_time: 20,
        image: "recipes/images/test.png".to_string(),
        tags: tags.to_vec(),
        ingredients: items
            .iter()
            .map(|&(id, amount)| LineItemInput { id, amount })
            .collect(),
    }
}

/// Author, one tag and the ingredients salt/sugar/flour (all in grams).
pub struct Kitchen {
    pub db: Database,
    pub chef: Uuid,
    pub lunch: Uuid,
    pub salt: Uuid,
    pub sugar: Uuid,
    pub flour: Uuid,
}

impl Kitchen {
    pub fn new() -> Self {
        let mut db = Database::default();
        let chef = user(&mut db, "chef");
        let lunch = tag(&mut db, "lunch");
        let salt = ingredient(&mut db, "Salt", "g");
        let sugar = ingredient(&mut db, "Sugar", "g");
        let flour = ingredient(&mut db, "Flour", "g");
        Self {
            db,
            chef,
            lunch,
            salt,
            sugar,
            flour,
        }
    }

    pub fn recipe(&mut self, name: &str, items: &[(Uuid, i64)]) -> Uuid {
        self.db
            .create_recipe(self.chef, draft(name, &[self.lunch], items))
            .unwrap()
            .id
    }
}
