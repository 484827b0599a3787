//! `Json`, `Query` and `Path` wrappers whose rejections are [`AppError`]s, so
//! malformed input gets the same error body as any other validation failure.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

const NON_FIELD: &str = "non_field_errors";

pub struct ApiJson<T>(pub T);

pub struct ApiQuery<T>(pub T);

/// A path parameter that fails to parse names no resource, so it is a 404.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_error(&rejection)),
        }
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_error(&rejection)),
        }
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("rejected path: {}", rejection.body_text());
                Err(AppError::not_found("Not found"))
            }
        }
    }
}

fn json_error(rejection: &JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            let text = e.body_text();
            let detail = text
                .split_once("target type: ")
                .map_or(text.as_str(), |(_, rest)| rest);
            let (field, message) = split_field(detail);
            AppError::invalid(field, message)
        }
        other => AppError::invalid(NON_FIELD, other.body_text()),
    }
}

fn query_error(rejection: &QueryRejection) -> AppError {
    AppError::invalid(NON_FIELD, rejection.body_text())
}

/// Deserialization errors read `path: message`, where the path looks like
/// `ingredients[0].id`. Only the top-level field is reported.
fn split_field(detail: &str) -> (&str, &str) {
    let Some((path, message)) = detail.split_once(": ") else {
        return (NON_FIELD, detail);
    };
    if path.is_empty() || path.contains(char::is_whitespace) {
        return (NON_FIELD, detail);
    }

    let end = path.find(['[', '.']).unwrap_or(path.len());
    match &path[..end] {
        "" => (NON_FIELD, message),
        field => (field, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_top_level_field() {
        assert_eq!(
            split_field("cooking_time: invalid type: string \"abc\", expected i64"),
            ("cooking_time", "invalid type: string \"abc\", expected i64")
        );
        assert_eq!(
            split_field("ingredients[0].id: UUID parsing failed"),
            ("ingredients", "UUID parsing failed")
        );
    }

    #[test]
    fn unlocated_errors_are_non_field() {
        assert_eq!(
            split_field("invalid type: map, expected a string"),
            (NON_FIELD, "invalid type: map, expected a string")
        );
        assert_eq!(split_field("EOF while parsing"), (NON_FIELD, "EOF while parsing"));
    }
}
