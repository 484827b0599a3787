//! Token authentication: `Authorization: Token <key>`.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

/// The caller, if any. An unknown or malformed token is rejected rather than
/// treated as anonymous.
pub struct MaybeUser(pub Option<Uuid>);

/// A caller that must be authenticated.
pub struct CurrentUser {
    pub id: Uuid,
    pub token: String,
}

fn token_from(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Token "))
        .map(|key| Some(key.trim().to_string()))
        .ok_or(AppError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from(parts)?.ok_or(AppError::Unauthorized)?;
        let id = state
            .storage
            .read()
            .await
            .user_for_token(&token)
            .ok_or(AppError::Unauthorized)?;

        Ok(Self { id, token })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if token_from(parts)?.is_none() {
            return Ok(Self(None));
        }

        let user = CurrentUser::from_request_parts(parts, state).await?;
        Ok(Self(Some(user.id)))
    }
}
