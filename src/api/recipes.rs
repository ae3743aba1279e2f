//! Recipe endpoints: CRUD, favorites, shopping cart and its export.
//!
//! Handlers only map HTTP to [`RecipeService`](crate::services::RecipeService)
//! calls; payload validation lives in [`super::validation`].

use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, State},
    http::{StatusCode, Uri, header},
    response::IntoResponse,
};
use std::sync::Arc;
use url::form_urlencoded;

use super::auth::require_user;
use super::extract::ApiJson;
use super::pagination::{page_request, paginate};
use super::types::{Page, RecipeDto, RecipeMinifiedDto, RecipeWriteRequest};
use super::validation::{validate_recipe_create, validate_recipe_update};
use super::{ApiError, AppState};
use crate::db::MembershipKind;
use crate::domain::{RecipeId, UserId, Viewer};
use crate::models::recipe::RecipeFilter;
use crate::services::RecipeError;

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::NotFound(id) => Self::not_found("Recipe", id),
            RecipeError::Validation { field, message } => Self::field(&field, message),
            RecipeError::Forbidden => Self::Forbidden(err.to_string()),
            RecipeError::Conflict(msg) => Self::Conflict(msg),
            RecipeError::EmptyCart => Self::NotFound(err.to_string()),
            RecipeError::Database(msg) => Self::DatabaseError(msg),
            RecipeError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Build list filters from the raw query so that `tags` may repeat.
/// Membership filters only apply for `1` and an authenticated viewer.
fn recipe_filter(uri: &Uri, viewer: Viewer) -> Result<RecipeFilter, ApiError> {
    let mut filter = RecipeFilter::default();

    for (key, value) in form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "author" => {
                let id = value
                    .parse::<i32>()
                    .map_err(|_| ApiError::field("author", "Author must be a user id"))?;
                filter.author = Some(UserId::new(id));
            }
            "tags" => {
                if !value.is_empty() {
                    filter.tag_slugs.push(value.into_owned());
                }
            }
            "is_favorited" => {
                if membership_flag("is_favorited", &value)? {
                    filter.favorited_by = viewer.user_id();
                }
            }
            "is_in_shopping_cart" => {
                if membership_flag("is_in_shopping_cart", &value)? {
                    filter.in_cart_of = viewer.user_id();
                }
            }
            _ => {}
        }
    }

    Ok(filter)
}

fn membership_flag(field: &str, value: &str) -> Result<bool, ApiError> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(ApiError::field(field, "Expected 0 or 1")),
    }
}

/// GET /recipes
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Page<RecipeDto>>, ApiError> {
    let filter = recipe_filter(&uri, viewer)?;
    let request = page_request(&uri, &state.config().pagination)?;

    let (recipes, count) = state
        .recipe_service()
        .list(viewer, filter, request)
        .await?;

    Ok(Json(paginate(&uri, request, count, recipes)?))
}

/// GET /recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeDto>, ApiError> {
    let recipe = state
        .recipe_service()
        .get(viewer, RecipeId::new(id))
        .await?;
    Ok(Json(recipe))
}

/// POST /recipes
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    ApiJson(payload): ApiJson<RecipeWriteRequest>,
) -> Result<(StatusCode, Json<RecipeDto>), ApiError> {
    let author = require_user(viewer)?;
    let input = validate_recipe_create(payload)?;

    let recipe = state.recipe_service().create(author, input).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// PATCH /recipes/{id}
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<RecipeWriteRequest>,
) -> Result<Json<RecipeDto>, ApiError> {
    let editor = require_user(viewer)?;
    let input = validate_recipe_update(payload)?;

    let recipe = state
        .recipe_service()
        .update(editor, RecipeId::new(id), input)
        .await?;
    Ok(Json(recipe))
}

/// DELETE /recipes/{id}
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let editor = require_user(viewer)?;
    state
        .recipe_service()
        .delete(editor, RecipeId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_membership(
    state: &AppState,
    viewer: Viewer,
    kind: MembershipKind,
    id: i32,
) -> Result<(StatusCode, Json<RecipeMinifiedDto>), ApiError> {
    let user = require_user(viewer)?;
    let recipe = state
        .recipe_service()
        .add_membership(kind, user, RecipeId::new(id))
        .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn remove_membership(
    state: &AppState,
    viewer: Viewer,
    kind: MembershipKind,
    id: i32,
) -> Result<StatusCode, ApiError> {
    let user = require_user(viewer)?;
    state
        .recipe_service()
        .remove_membership(kind, user, RecipeId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/favorite
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeMinifiedDto>), ApiError> {
    add_membership(&state, viewer, MembershipKind::Favorite, id).await
}

/// DELETE /recipes/{id}/favorite
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_membership(&state, viewer, MembershipKind::Favorite, id).await
}

/// POST /recipes/{id}/shopping_cart
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeMinifiedDto>), ApiError> {
    add_membership(&state, viewer, MembershipKind::ShoppingCart, id).await
}

/// DELETE /recipes/{id}/shopping_cart
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_membership(&state, viewer, MembershipKind::ShoppingCart, id).await
}

/// GET /recipes/download_shopping_cart
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(viewer)?;
    let text = state.recipe_service().shopping_list(user).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_filter_collects_repeated_tags() {
        let uri: Uri = "/api/recipes?tags=lunch&tags=dinner&author=4".parse().unwrap();
        let filter = recipe_filter(&uri, Viewer::Anonymous).unwrap();

        assert_eq!(filter.tag_slugs, vec!["lunch", "dinner"]);
        assert_eq!(filter.author, Some(UserId::new(4)));
    }

    #[test]
    fn test_membership_filters_need_a_user() {
        let uri: Uri = "/api/recipes?is_favorited=1&is_in_shopping_cart=1"
            .parse()
            .unwrap();

        let anonymous = recipe_filter(&uri, Viewer::Anonymous).unwrap();
        assert_eq!(anonymous.favorited_by, None);
        assert_eq!(anonymous.in_cart_of, None);

        let me = UserId::new(9);
        let filter = recipe_filter(&uri, Viewer::User(me)).unwrap();
        assert_eq!(filter.favorited_by, Some(me));
        assert_eq!(filter.in_cart_of, Some(me));
    }

    #[test]
    fn test_membership_filter_rejects_other_values() {
        let uri: Uri = "/api/recipes?is_favorited=yes".parse().unwrap();
        assert!(recipe_filter(&uri, Viewer::Anonymous).is_err());

        let uri: Uri = "/api/recipes?is_favorited=0".parse().unwrap();
        let filter = recipe_filter(&uri, Viewer::User(UserId::new(1))).unwrap();
        assert_eq!(filter.favorited_by, None);
    }
}
