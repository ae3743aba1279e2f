use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::IngredientDto;
use super::{ApiError, AppState};
use crate::services::views;

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

/// GET /ingredients?name=<prefix>
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<IngredientDto>>, ApiError> {
    let ingredients = state
        .store()
        .search_ingredients(query.name.as_deref())
        .await?;

    Ok(Json(ingredients.iter().map(views::ingredient_view).collect()))
}

/// GET /ingredients/{id}
pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<IngredientDto>, ApiError> {
    let ingredient = state
        .store()
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient", id))?;

    Ok(Json(views::ingredient_view(&ingredient)))
}
