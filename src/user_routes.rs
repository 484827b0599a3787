use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tokio::task;
use uuid::Uuid;

use crate::{
    auth::{CurrentUser, MaybeUser},
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{Page, Pagination},
    state::AppState,
    user_models::{
        CreatedUser, LoginRequest, NewUser, SetPasswordRequest, Subscription, TokenResponse,
        UserView,
    },
    user_storage::{hash_password, verify_password},
};

type SharedState = State<Arc<AppState>>;

async fn hash_off_thread(password: String, cost: u32) -> AppResult<String> {
    task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

async fn verify_off_thread(password: String, hash: String) -> AppResult<bool> {
    task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
}

pub async fn register(
    State(state): SharedState,
    ApiJson(payload): ApiJson<NewUser>,
) -> AppResult<(StatusCode, Json<CreatedUser>)> {
    state.storage.read().await.validate_new_user(&payload)?;

    let hash = hash_off_thread(payload.password.clone(), state.config.bcrypt_cost).await?;
    let user = state
        .storage
        .transaction(move |db| db.register_user(payload, hash))
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedUser::from(&user))))
}

pub async fn list_users(
    State(state): SharedState,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Json<Page<UserView>> {
    let users = state.storage.read().await.list_users(viewer);
    Json(Page::paginate(
        users,
        pagination.page.unwrap_or(1),
        pagination.limit.unwrap_or(state.config.page_size),
    ))
}

pub async fn get_user(
    State(state): SharedState,
    MaybeUser(viewer): MaybeUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.storage.read().await.user_view(id, viewer)?))
}

pub async fn me(State(state): SharedState, user: CurrentUser) -> AppResult<Json<UserView>> {
    Ok(Json(
        state.storage.read().await.user_view(user.id, Some(user.id))?,
    ))
}

pub async fn login(
    State(state): SharedState,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let invalid = || {
        AppError::invalid(
            "non_field_errors",
            "Unable to log in with provided credentials",
        )
    };

    let (user_id, hash) = {
        let db = state.storage.read().await;
        let user = db.user_by_email(&payload.email).ok_or_else(invalid)?;
        (user.id, user.password_hash.clone())
    };

    if !verify_off_thread(payload.password, hash).await? {
        return Err(invalid());
    }

    let token = state
        .storage
        .transaction(move |db| Ok(db.issue_token(user_id)))
        .await?;

    Ok(Json(TokenResponse {
        auth_token: token.key,
    }))
}

pub async fn logout(State(state): SharedState, user: CurrentUser) -> AppResult<StatusCode> {
    state
        .storage
        .transaction(move |db| db.revoke_token(&user.token))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_password(
    State(state): SharedState,
    user: CurrentUser,
    ApiJson(payload): ApiJson<SetPasswordRequest>,
) -> AppResult<StatusCode> {
    if payload.new_password.is_empty() {
        return Err(AppError::invalid("new_password", "This field may not be blank"));
    }

    let hash = {
        let db = state.storage.read().await;
        db.user(user.id)
            .map(|u| u.password_hash.clone())
            .ok_or_else(|| AppError::not_found("User not found"))?
    };

    if !verify_off_thread(payload.current_password, hash).await? {
        return Err(AppError::invalid("current_password", "Invalid password"));
    }

    let new_hash = hash_off_thread(payload.new_password, state.config.bcrypt_cost).await?;
    state
        .storage
        .transaction(move |db| db.set_password_hash(user.id, new_hash))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub recipes_limit: Option<String>,
}

impl SubscriptionQuery {
    /// Anything but a non-negative integer means no limit.
    fn recipes_limit(&self) -> Option<usize> {
        self.recipes_limit.as_deref().and_then(|v| v.parse().ok())
    }
}

pub async fn subscriptions(
    State(state): SharedState,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<SubscriptionQuery>,
) -> AppResult<Json<Page<Subscription>>> {
    let subscriptions = state
        .storage
        .read()
        .await
        .subscriptions(user.id, query.recipes_limit())?;

    Ok(Json(Page::paginate(
        subscriptions,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(state.config.page_size),
    )))
}

pub async fn subscribe(
    State(state): SharedState,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<SubscriptionQuery>,
) -> AppResult<(StatusCode, Json<Subscription>)> {
    let recipes_limit = query.recipes_limit();
    let subscription = state
        .storage
        .transaction(move |db| db.follow(user.id, id, recipes_limit))
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn unsubscribe(
    State(state): SharedState,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    state
        .storage
        .transaction(move |db| db.unfollow(user.id, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
