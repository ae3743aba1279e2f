//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::domain::UserId;
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
    security: Arc<SecurityConfig>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: Arc<SecurityConfig>) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let Some(user) = self.store.verify_user_password(email, password).await? else {
            warn!(email = %email, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        };

        let token = self.store.get_or_create_token(user.id).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    async fn logout(&self, user: UserId) -> Result<(), AuthError> {
        self.store.delete_token(user).await?;
        info!(user_id = %user, "User logged out");
        Ok(())
    }

    async fn resolve_token(&self, token: &str) -> Result<UserId, AuthError> {
        self.store
            .user_for_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    async fn change_password(
        &self,
        user: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if !self.store.check_user_password(user, current_password).await? {
            return Err(AuthError::Validation {
                field: "current_password".to_string(),
                message: "Current password is incorrect".to_string(),
            });
        }

        self.store
            .update_user_password(user, new_password, &self.security)
            .await?;

        info!(user_id = %user, "Password changed");
        Ok(())
    }
}
