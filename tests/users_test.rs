#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{new_user, user};
use foodgram::error::AppError;
use foodgram::storage::Database;
use foodgram::user_models::NewUser;

fn rejected_fields(db: &mut Database, registration: NewUser) -> Vec<&'static str> {
    let Err(AppError::Validation(errors)) = db.register_user(registration, "hash".into()) else {
        panic!("expected validation error");
    };
    ["email", "username", "first_name", "last_name", "password"]
        .into_iter()
        .filter(|f| errors.has(f))
        .collect()
}

#[test]
fn test_register_and_list() {
    let mut db = Database::default();
    let zed = user(&mut db, "zed");
    let amy = user(&mut db, "amy");

    let listed = db.list_users(None);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, amy, "ordered by email");
    assert_eq!(listed[1].id, zed);
    assert!(listed.iter().all(|u| !u.is_subscribed));
}

#[test]
fn test_duplicate_email_and_username() {
    let mut db = Database::default();
    user(&mut db, "chef");

    let mut same_email = new_user("other");
    same_email.email = "chef@example.com".into();
    assert_eq!(rejected_fields(&mut db, same_email), vec!["email"]);

    let mut same_name = new_user("chef");
    same_name.email = "else@example.com".into();
    assert_eq!(rejected_fields(&mut db, same_name), vec!["username"]);
    assert_eq!(db.users.len(), 1);
}

#[test]
fn test_field_rules() {
    let mut db = Database::default();

    assert_eq!(rejected_fields(&mut db, new_user("me")), vec!["username"]);
    assert_eq!(rejected_fields(&mut db, new_user("bad name")), vec!["username"]);

    let mut blank = NewUser::default();
    blank.email = "no-at-sign".into();
    assert_eq!(
        rejected_fields(&mut db, blank),
        vec!["email", "username", "first_name", "last_name", "password"]
    );

    let mut long = new_user("longname");
    long.first_name = "a".repeat(151);
    assert_eq!(rejected_fields(&mut db, long), vec!["first_name"]);
    assert!(db.users.is_empty());
}

#[test]
fn test_tokens() {
    let mut db = Database::default();
    let id = user(&mut db, "chef");

    let token = db.issue_token(id);
    assert_eq!(db.user_for_token(&token.key), Some(id));
    assert_eq!(db.issue_token(id).key, token.key, "live token is reused");

    db.revoke_token(&token.key).unwrap();
    assert_eq!(db.user_for_token(&token.key), None);
    assert!(matches!(
        db.revoke_token(&token.key),
        Err(AppError::Unauthorized)
    ));
}
