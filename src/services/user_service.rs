//! Domain service for user profiles and author subscriptions.

use thiserror::Error;

use crate::api::types::{SubscriptionDto, UserCreatedDto, UserDto};
use crate::domain::{UserId, Viewer};
use crate::models::PageRequest;
use crate::models::user::NewUser;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(UserId),

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] when the email or username is taken.
    async fn register(&self, new_user: NewUser) -> Result<UserCreatedDto, UserError>;

    async fn list(&self, viewer: Viewer, page: PageRequest)
    -> Result<(Vec<UserDto>, u64), UserError>;

    async fn get(&self, viewer: Viewer, id: UserId) -> Result<UserDto, UserError>;

    /// # Errors
    ///
    /// [`UserError::Validation`] when `user` targets themselves,
    /// [`UserError::NotFound`] for an unknown author,
    /// [`UserError::Conflict`] when already subscribed.
    async fn subscribe(
        &self,
        user: UserId,
        author: UserId,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError>;

    /// # Errors
    ///
    /// Same as [`UserService::subscribe`], with [`UserError::Conflict`] when
    /// there is no subscription.
    async fn unsubscribe(&self, user: UserId, author: UserId) -> Result<(), UserError>;

    /// Authors followed by `user`, each with up to `recipes_limit` recipes.
    async fn subscriptions(
        &self,
        user: UserId,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<(Vec<SubscriptionDto>, u64), UserError>;
}
