//! Domain service for recipes and the per-user recipe memberships
//! (favorites and shopping cart).

use thiserror::Error;

use crate::api::types::{RecipeDto, RecipeMinifiedDto};
use crate::db::MembershipKind;
use crate::domain::{RecipeId, UserId, Viewer};
use crate::models::PageRequest;
use crate::models::recipe::{IngredientAmountInput, RecipeFilter};

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Recipe {0} not found")]
    NotFound(RecipeId),

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Only the author can modify this recipe")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("Shopping cart is empty")]
    EmptyCart,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecipeError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Field-validated create payload. `image` is still the raw data URI.
#[derive(Debug, Clone)]
pub struct CreateRecipe {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmountInput>,
}

/// Field-validated update payload. Tags and ingredients are mandatory and
/// replace the current ones.
#[derive(Debug, Clone)]
pub struct UpdateRecipe {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmountInput>,
}

#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// Page of recipes matching `filter`, newest first, plus the total count.
    async fn list(
        &self,
        viewer: Viewer,
        filter: RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<RecipeDto>, u64), RecipeError>;

    async fn get(&self, viewer: Viewer, id: RecipeId) -> Result<RecipeDto, RecipeError>;

    /// Stores the image, then inserts the recipe with its links atomically.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] for unknown tag or ingredient ids
    /// and malformed images.
    async fn create(&self, author: UserId, input: CreateRecipe) -> Result<RecipeDto, RecipeError>;

    /// # Errors
    ///
    /// Returns [`RecipeError::Forbidden`] when `editor` is not the author.
    async fn update(
        &self,
        editor: UserId,
        id: RecipeId,
        input: UpdateRecipe,
    ) -> Result<RecipeDto, RecipeError>;

    async fn delete(&self, editor: UserId, id: RecipeId) -> Result<(), RecipeError>;

    /// # Errors
    ///
    /// [`RecipeError::NotFound`] for an unknown recipe,
    /// [`RecipeError::Conflict`] when the membership already exists.
    async fn add_membership(
        &self,
        kind: MembershipKind,
        user: UserId,
        id: RecipeId,
    ) -> Result<RecipeMinifiedDto, RecipeError>;

    /// # Errors
    ///
    /// [`RecipeError::NotFound`] for an unknown recipe,
    /// [`RecipeError::Conflict`] when there is no membership to remove.
    async fn remove_membership(
        &self,
        kind: MembershipKind,
        user: UserId,
        id: RecipeId,
    ) -> Result<(), RecipeError>;

    /// Rendered shopping list for the user's cart.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::EmptyCart`] when nothing is in the cart.
    async fn shopping_list(&self, user: UserId) -> Result<String, RecipeError>;
}
