use super::membership::is_unique_violation;
use crate::domain::UserId;
use crate::entities::{prelude::*, subscriptions};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

pub struct SubscriptionRepository {
    conn: DatabaseConnection,
}

impl SubscriptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, user: UserId, author: UserId) -> Result<bool> {
        let count = Subscriptions::find()
            .filter(subscriptions::Column::UserId.eq(user.value()))
            .filter(subscriptions::Column::AuthorId.eq(author.value()))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Returns `false` when `user` already follows `author`.
    pub async fn add(&self, user: UserId, author: UserId) -> Result<bool> {
        if self.exists(user, author).await? {
            return Ok(false);
        }

        let inserted = subscriptions::ActiveModel {
            user_id: Set(user.value()),
            author_id: Set(author.value()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns `false` when there was no subscription to delete.
    pub async fn remove(&self, user: UserId, author: UserId) -> Result<bool> {
        let result = Subscriptions::delete_many()
            .filter(subscriptions::Column::UserId.eq(user.value()))
            .filter(subscriptions::Column::AuthorId.eq(author.value()))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
