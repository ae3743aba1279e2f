//! `SeaORM` implementation of the `UserService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::api::types::{SubscriptionDto, UserCreatedDto, UserDto};
use crate::config::SecurityConfig;
use crate::db::Store;
use crate::domain::{UserId, Viewer};
use crate::models::PageRequest;
use crate::models::user::{NewUser, User};
use crate::services::user_service::{UserError, UserService};
use crate::services::views;

pub struct SeaOrmUserService {
    store: Store,
    security: Arc<SecurityConfig>,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: Arc<SecurityConfig>) -> Self {
        Self { store, security }
    }

    async fn load(&self, id: UserId) -> Result<User, UserError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Shared preconditions of subscribe and unsubscribe.
    async fn subscription_target(&self, user: UserId, author: UserId) -> Result<User, UserError> {
        if user == author {
            return Err(UserError::validation(
                "author",
                "You cannot subscribe to yourself",
            ));
        }
        self.load(author).await
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, new_user: NewUser) -> Result<UserCreatedDto, UserError> {
        if self.store.email_taken(&new_user.email).await? {
            return Err(UserError::validation(
                "email",
                "A user with this email already exists",
            ));
        }
        if self.store.username_taken(&new_user.username).await? {
            return Err(UserError::validation(
                "username",
                "A user with this username already exists",
            ));
        }

        let user = self.store.create_user(new_user, &self.security).await?;
        info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(views::user_created_view(&user))
    }

    async fn list(
        &self,
        viewer: Viewer,
        page: PageRequest,
    ) -> Result<(Vec<UserDto>, u64), UserError> {
        let (users, total) = self.store.list_users(page).await?;

        let mut dtos = Vec::with_capacity(users.len());
        for user in &users {
            dtos.push(views::user_view(&self.store, viewer, user).await?);
        }

        Ok((dtos, total))
    }

    async fn get(&self, viewer: Viewer, id: UserId) -> Result<UserDto, UserError> {
        let user = self.load(id).await?;
        Ok(views::user_view(&self.store, viewer, &user).await?)
    }

    async fn subscribe(
        &self,
        user: UserId,
        author: UserId,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError> {
        let target = self.subscription_target(user, author).await?;

        if !self.store.subscribe(user, author).await? {
            return Err(UserError::Conflict(
                "You are already subscribed to this author".to_string(),
            ));
        }

        info!(user_id = %user, author_id = %author, "Subscribed");
        Ok(views::subscription_view(&self.store, Viewer::User(user), &target, recipes_limit).await?)
    }

    async fn unsubscribe(&self, user: UserId, author: UserId) -> Result<(), UserError> {
        self.subscription_target(user, author).await?;

        if !self.store.unsubscribe(user, author).await? {
            return Err(UserError::Conflict(
                "You are not subscribed to this author".to_string(),
            ));
        }

        info!(user_id = %user, author_id = %author, "Unsubscribed");
        Ok(())
    }

    async fn subscriptions(
        &self,
        user: UserId,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<(Vec<SubscriptionDto>, u64), UserError> {
        let (authors, total) = self.store.list_followed_authors(user, page).await?;

        let mut dtos = Vec::with_capacity(authors.len());
        for author in &authors {
            dtos.push(
                views::subscription_view(&self.store, Viewer::User(user), author, recipes_limit)
                    .await?,
            );
        }

        Ok((dtos, total))
    }
}
