//! Body extractor that reports malformed JSON as a 400 validation error.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use super::ApiError;

/// `Json<T>` whose rejection is an [`ApiError`] instead of axum's plain-text
/// 400/415/422 responses.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(into_api_error(&rejection)),
        }
    }
}

fn into_api_error(rejection: &JsonRejection) -> ApiError {
    let text = rejection.body_text();
    let field = match rejection {
        JsonRejection::JsonDataError(_) => rejected_field(&text).map(str::to_owned),
        _ => None,
    };

    match field {
        Some(field) => ApiError::field(&field, text),
        None => ApiError::validation(text),
    }
}

/// Top-level field named in a deserialization message such as
/// `...target type: ingredients[0].amount: invalid type`.
fn rejected_field(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("target type: ")?;
    let (path, _) = rest.split_once(": ")?;
    let field = path.split(['.', '[']).next()?;

    (!field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .then_some(field)
}
