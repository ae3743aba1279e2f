//! User endpoints: registration, profiles, password change and
//! subscriptions.

use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::require_user;
use super::extract::ApiJson;
use super::pagination::{page_request, paginate};
use super::types::{
    Page, RegisterRequest, SetPasswordRequest, SubscriptionDto, UserCreatedDto, UserDto,
};
use super::validation::{validate_password, validate_registration};
use super::{ApiError, AppState};
use crate::domain::{UserId, Viewer};
use crate::services::UserError;

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => Self::not_found("User", id),
            UserError::Validation { field, message } => Self::field(&field, message),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<String>,
}

impl RecipesLimitQuery {
    fn limit(&self) -> Result<Option<u64>, ApiError> {
        self.recipes_limit
            .as_deref()
            .map(|raw| {
                raw.parse::<u32>().map(u64::from).map_err(|_| {
                    ApiError::field(
                        "recipes_limit",
                        format!("recipes_limit must be an integer between 0 and {}", u32::MAX),
                    )
                })
            })
            .transpose()
    }
}

/// POST /users
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserCreatedDto>), ApiError> {
    let new_user = validate_registration(payload)?;
    let user = state.user_service().register(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Page<UserDto>>, ApiError> {
    let request = page_request(&uri, &state.config().pagination)?;
    let (users, count) = state.user_service().list(viewer, request).await?;
    Ok(Json(paginate(&uri, request, count, users)?))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state
        .user_service()
        .get(viewer, UserId::new(id))
        .await?;
    Ok(Json(user))
}

/// GET /users/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<UserDto>, ApiError> {
    let id = require_user(viewer)?;
    let user = state.user_service().get(viewer, id).await?;
    Ok(Json(user))
}

/// POST /users/set_password
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    ApiJson(payload): ApiJson<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user = require_user(viewer)?;

    let current = payload
        .current_password
        .ok_or_else(|| ApiError::field("current_password", "This field is required"))?;
    let new_password = validate_password("new_password", payload.new_password)?;

    state
        .auth_service()
        .change_password(user, &current, &new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/{id}/subscribe
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
    Query(query): Query<RecipesLimitQuery>,
) -> Result<(StatusCode, Json<SubscriptionDto>), ApiError> {
    let user = require_user(viewer)?;
    let limit = query.limit()?;

    let subscription = state
        .user_service()
        .subscribe(user, UserId::new(id), limit)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// DELETE /users/{id}/subscribe
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let user = require_user(viewer)?;
    state
        .user_service()
        .unsubscribe(user, UserId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/subscriptions
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<RecipesLimitQuery>,
) -> Result<Json<Page<SubscriptionDto>>, ApiError> {
    let user = require_user(viewer)?;
    let limit = query.limit()?;
    let request = page_request(&uri, &state.config().pagination)?;

    let (authors, count) = state
        .user_service()
        .subscriptions(user, request, limit)
        .await?;
    Ok(Json(paginate(&uri, request, count, authors)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipes_limit_parsing() {
        let none = RecipesLimitQuery { recipes_limit: None };
        assert_eq!(none.limit().unwrap(), None);

        let three = RecipesLimitQuery {
            recipes_limit: Some("3".to_string()),
        };
        assert_eq!(three.limit().unwrap(), Some(3));

        let bad = RecipesLimitQuery {
            recipes_limit: Some("-1".to_string()),
        };
        assert!(bad.limit().is_err());

        let huge = RecipesLimitQuery {
            recipes_limit: Some(u64::MAX.to_string()),
        };
        assert!(huge.limit().is_err());
    }
}
