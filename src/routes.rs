use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{CurrentUser, MaybeUser},
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{
        Ingredient, Page, RecipeDetail, RecipeFilter, RecipeList, RecipeMinified, RecipePayload,
        Tag,
    },
    shopping_list::{render_shopping_list, shopping_list_filename},
    state::AppState,
};

type SharedState = State<Arc<AppState>>;

pub async fn list_tags(State(state): SharedState) -> Json<Vec<Tag>> {
    Json(state.storage.read().await.list_tags())
}

pub async fn get_tag(
    State(state): SharedState,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Tag>> {
    Ok(Json(state.storage.read().await.get_tag(id)?))
}

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

pub async fn list_ingredients(
    State(state): SharedState,
    ApiQuery(query): ApiQuery<IngredientQuery>,
) -> Json<Vec<Ingredient>> {
    Json(
        state
            .storage
            .read()
            .await
            .list_ingredients(query.name.as_deref()),
    )
}

pub async fn get_ingredient(
    State(state): SharedState,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Ingredient>> {
    Ok(Json(state.storage.read().await.get_ingredient(id)?))
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

/// `tags` may repeat, so the query string is read as raw pairs.
fn parse_recipe_query(params: &[(String, String)]) -> AppResult<(RecipeFilter, Option<usize>, Option<usize>)> {
    let mut filter = RecipeFilter::default();
    let mut page = None;
    let mut limit = None;

    let number = |key: &str, value: &str| {
        value
            .parse::<usize>()
            .map_err(|_| AppError::invalid(key, "A valid integer is required"))
    };

    for (key, value) in params {
        match key.as_str() {
            "author" => {
                let author = value
                    .parse()
                    .map_err(|_| AppError::invalid("author", "Must be a valid user id"))?;
                filter.author = Some(author);
            }
            "is_favorited" => filter.is_favorited = is_truthy(value),
            "is_in_shopping_cart" => filter.is_in_shopping_cart = is_truthy(value),
            "tags" => filter.tags.push(value.clone()),
            "page" => page = Some(number("page", value)?),
            "limit" => limit = Some(number("limit", value)?),
            _ => {}
        }
    }

    Ok((filter, page, limit))
}

pub async fn list_recipes(
    State(state): SharedState,
    MaybeUser(viewer): MaybeUser,
    ApiQuery(params): ApiQuery<Vec<(String, String)>>,
) -> AppResult<Json<Page<RecipeDetail>>> {
    let (filter, page, limit) = parse_recipe_query(&params)?;
    let recipes = state.storage.read().await.list_recipes(viewer, &filter)?;

    Ok(Json(Page::paginate(
        recipes,
        page.unwrap_or(1),
        limit.unwrap_or(state.config.page_size),
    )))
}

pub async fn get_recipe(
    State(state): SharedState,
    MaybeUser(viewer): MaybeUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<RecipeDetail>> {
    Ok(Json(state.storage.read().await.get_recipe_detail(id, viewer)?))
}

/// Stores the image ahead of the transaction; `None` when none was sent.
async fn store_image(state: &AppState, image: Option<&str>) -> AppResult<Option<String>> {
    match image.map(str::trim) {
        Some(uri) if !uri.is_empty() => Ok(Some(state.assets.save_data_uri(uri).await?)),
        _ => Ok(None),
    }
}

pub async fn create_recipe(
    State(state): SharedState,
    user: CurrentUser,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> AppResult<(StatusCode, Json<RecipeDetail>)> {
    let image = store_image(&state, payload.image.as_deref()).await?;
    let asset = image.clone().unwrap_or_default();

    let result = state
        .storage
        .transaction(move |db| {
            let recipe = db.create_recipe(user.id, payload.into_draft(asset))?;
            db.recipe_detail(&recipe, &db.viewer(Some(user.id)))
        })
        .await;

    match result {
        Ok(detail) => Ok((StatusCode::CREATED, Json(detail))),
        Err(e) => {
            if let Some(image) = image {
                state.assets.discard(&image).await;
            }
            Err(e)
        }
    }
}

pub async fn update_recipe(
    State(state): SharedState,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> AppResult<Json<RecipeDetail>> {
    let image = store_image(&state, payload.image.as_deref()).await?;
    let new_image = image.clone();

    let result = state
        .storage
        .transaction(move |db| {
            let previous = db
                .recipe(id)
                .map(|r| r.image.clone())
                .ok_or_else(|| AppError::not_found("Recipe not found"))?;
            let asset = new_image.unwrap_or_else(|| previous.clone());

            let recipe = db.update_recipe(user.id, id, payload.into_draft(asset))?;
            let detail = db.recipe_detail(&recipe, &db.viewer(Some(user.id)))?;
            Ok((detail, previous, recipe.image))
        })
        .await;

    match result {
        Ok((detail, previous, current)) => {
            if previous != current {
                state.assets.discard(&previous).await;
            }
            Ok(Json(detail))
        }
        Err(e) => {
            if let Some(image) = image {
                state.assets.discard(&image).await;
            }
            Err(e)
        }
    }
}

pub async fn delete_recipe(
    State(state): SharedState,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    let recipe = state
        .storage
        .transaction(move |db| db.delete_recipe(user.id, id))
        .await?;

    state.assets.discard(&recipe.image).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to(
    state: &AppState,
    list: RecipeList,
    user: CurrentUser,
    id: Uuid,
) -> AppResult<(StatusCode, Json<RecipeMinified>)> {
    let recipe = state
        .storage
        .transaction(move |db| db.add_to_list(list, user.id, id))
        .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn remove_from(
    state: &AppState,
    list: RecipeList,
    user: CurrentUser,
    id: Uuid,
) -> AppResult<StatusCode> {
    state
        .storage
        .transaction(move |db| db.remove_from_list(list, user.id, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): SharedState,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<(StatusCode, Json<RecipeMinified>)> {
    add_to(&state, RecipeList::Favorites, user, id).await
}

pub async fn remove_favorite(
    State(state): SharedState,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    remove_from(&state, RecipeList::Favorites, user, id).await
}

pub async fn add_to_cart(
    State(state): SharedState,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<(StatusCode, Json<RecipeMinified>)> {
    add_to(&state, RecipeList::ShoppingCart, user, id).await
}

pub async fn remove_from_cart(
    State(state): SharedState,
    user: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    remove_from(&state, RecipeList::ShoppingCart, user, id).await
}

pub async fn download_shopping_cart(
    State(state): SharedState,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let (username, items) = {
        let db = state.storage.read().await;
        let username = db
            .user(user.id)
            .map(|u| u.username.clone())
            .ok_or_else(|| AppError::not_found("User not found"))?;
        (username, db.shopping_list(user.id))
    };

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                shopping_list_filename(&username)
            ),
        ),
    ];

    Ok((headers, render_shopping_list(&items)))
}
