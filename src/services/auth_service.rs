//! Domain service for authentication.
//!
//! Handles token login/logout, token resolution and password changes.

use thiserror::Error;

use crate::domain::UserId;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the user's token, creating it on
    /// first login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Deletes the user's token.
    async fn logout(&self, user: UserId) -> Result<(), AuthError>;

    /// Resolves a token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for unknown tokens.
    async fn resolve_token(&self, token: &str) -> Result<UserId, AuthError>;

    /// Changes a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect.
    async fn change_password(
        &self,
        user: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
