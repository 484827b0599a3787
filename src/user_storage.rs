use anyhow::Context;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::check_text;
use crate::error::{AppError, AppResult, ValidationErrors};
use crate::models::RecipeMinified;
use crate::storage::Database;
use crate::user_models::{
    AuthToken, Follow, NewUser, Subscription, User, UserView, MAX_EMAIL_LEN, MAX_NAME_LEN,
};

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    Ok(bcrypt::hash(password, cost).context("Failed to hash password")?)
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    Ok(bcrypt::verify(password, hash).context("Failed to verify password")?)
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

impl Database {
    /// Field checks for a registration, run before the password is hashed.
    pub fn validate_new_user(&self, new: &NewUser) -> AppResult<()> {
        let mut errors = ValidationErrors::default();

        check_text(&mut errors, "email", &new.email, MAX_EMAIL_LEN);
        if !new.email.trim().is_empty() && !new.email.contains('@') {
            errors.add("email", "Enter a valid email address");
        }
        if self.user_by_email(new.email.trim()).is_some() {
            errors.add("email", "A user with that email already exists");
        }

        check_text(&mut errors, "username", &new.username, MAX_NAME_LEN);
        if !is_valid_username(&new.username) {
            errors.add(
                "username",
                "Username may contain only letters, digits and @/./+/-/_",
            );
        }
        if new.username == "me" {
            errors.add("username", "Username 'me' is not allowed");
        }
        if self.users.iter().any(|u| u.username == new.username) {
            errors.add("username", "A user with that username already exists");
        }

        check_text(&mut errors, "first_name", &new.first_name, MAX_NAME_LEN);
        check_text(&mut errors, "last_name", &new.last_name, MAX_NAME_LEN);
        if new.password.is_empty() {
            errors.add("password", "This field may not be blank");
        }

        errors.into_result()
    }

    pub fn register_user(&mut self, new: NewUser, password_hash: String) -> AppResult<User> {
        self.validate_new_user(&new)?;

        let user = User::new(new, password_hash);
        info!(id = %user.id, username = %user.username, "user registered");
        self.users.push(user.clone());
        Ok(user)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    /// Reuses the user's live token if there is one.
    pub fn issue_token(&mut self, user_id: Uuid) -> AuthToken {
        if let Some(token) = self.tokens.iter().find(|t| t.user_id == user_id) {
            return token.clone();
        }

        let token = AuthToken::new(user_id);
        self.tokens.push(token.clone());
        token
    }

    pub fn revoke_token(&mut self, key: &str) -> AppResult<()> {
        let before = self.tokens.len();
        self.tokens.retain(|t| t.key != key);
        if self.tokens.len() == before {
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }

    pub fn user_for_token(&self, key: &str) -> Option<Uuid> {
        self.tokens.iter().find(|t| t.key == key).map(|t| t.user_id)
    }

    pub fn set_password_hash(&mut self, user_id: Uuid, password_hash: String) -> AppResult<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.password_hash = password_hash;
        info!(id = %user_id, "password changed");
        Ok(())
    }

    pub fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> bool {
        self.follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followed_id == followed_id)
    }

    pub fn user_view(&self, user_id: Uuid, viewer: Option<Uuid>) -> AppResult<UserView> {
        let user = self
            .user(user_id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let subscribed = viewer.is_some_and(|v| self.is_following(v, user_id));
        Ok(user.view(subscribed))
    }

    /// Ordered by (email, username).
    pub fn list_users(&self, viewer: Option<Uuid>) -> Vec<UserView> {
        let viewer = self.viewer(viewer);
        let mut users: Vec<&User> = self.users.iter().collect();
        users.sort_by(|a, b| (&a.email, &a.username).cmp(&(&b.email, &b.username)));
        users
            .into_iter()
            .map(|u| u.view(viewer.follows(u.id)))
            .collect()
    }

    pub fn follow(
        &mut self,
        follower_id: Uuid,
        followed_id: Uuid,
        recipes_limit: Option<usize>,
    ) -> AppResult<Subscription> {
        if self.user(followed_id).is_none() {
            return Err(AppError::not_found("User not found"));
        }
        if follower_id == followed_id {
            debug!(user = %follower_id, "self-follow refused");
            return Err(AppError::invalid("user", "You cannot subscribe to yourself"));
        }
        if self.is_following(follower_id, followed_id) {
            return Err(AppError::conflict("Subscription already exists"));
        }

        self.follows.push(Follow::new(follower_id, followed_id));
        info!(follower = %follower_id, followed = %followed_id, "subscribed");
        self.subscription(followed_id, Some(follower_id), recipes_limit)
    }

    pub fn unfollow(&mut self, follower_id: Uuid, followed_id: Uuid) -> AppResult<()> {
        if self.user(followed_id).is_none() {
            return Err(AppError::not_found("User not found"));
        }

        let before = self.follows.len();
        self.follows
            .retain(|f| !(f.follower_id == follower_id && f.followed_id == followed_id));
        if self.follows.len() == before {
            return Err(AppError::not_found("You are not subscribed to this user"));
        }

        info!(follower = %follower_id, followed = %followed_id, "unsubscribed");
        Ok(())
    }

    /// Recipes by `author_id` in creation order, cut to `limit` if given.
    pub fn list_followed_recipes(
        &self,
        author_id: Uuid,
        limit: Option<usize>,
    ) -> Vec<RecipeMinified> {
        let mut recipes: Vec<_> = self
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .collect();
        recipes.sort_by_key(|r| r.created_at);

        recipes
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(RecipeMinified::from)
            .collect()
    }

    pub fn subscription(
        &self,
        author_id: Uuid,
        viewer: Option<Uuid>,
        recipes_limit: Option<usize>,
    ) -> AppResult<Subscription> {
        let user = self.user_view(author_id, viewer)?;
        let recipes_count = self
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .count();

        Ok(Subscription {
            user,
            recipes: self.list_followed_recipes(author_id, recipes_limit),
            recipes_count,
        })
    }

    /// Everyone `user_id` follows, in follow order.
    pub fn subscriptions(
        &self,
        user_id: Uuid,
        recipes_limit: Option<usize>,
    ) -> AppResult<Vec<Subscription>> {
        self.follows
            .iter()
            .filter(|f| f.follower_id == user_id)
            .map(|f| self.subscription(f.followed_id, Some(user_id), recipes_limit))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_characters() {
        assert!(is_valid_username("chef.mike+1@home"));
        assert!(is_valid_username("повар_2"));
        assert!(!is_valid_username("two words"));
        assert!(!is_valid_username("semi;colon"));
    }

    #[test]
    fn bcrypt_round_trip() {
        let hash = hash_password("s3cret", 4).unwrap();
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
