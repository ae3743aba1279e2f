use crate::domain::{RecipeId, UserId};
use crate::entities::{favorite_recipes, prelude::*, shopping_cart_recipes};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};

/// Which user-recipe membership table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipKind {
    Favorite,
    ShoppingCart,
}

impl MembershipKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::ShoppingCart => "shopping_cart",
        }
    }
}

pub struct MembershipRepository {
    conn: DatabaseConnection,
}

impl MembershipRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, kind: MembershipKind, user: UserId, recipe: RecipeId) -> Result<bool> {
        let count = match kind {
            MembershipKind::Favorite => {
                FavoriteRecipes::find()
                    .filter(favorite_recipes::Column::UserId.eq(user.value()))
                    .filter(favorite_recipes::Column::RecipeId.eq(recipe.value()))
                    .count(&self.conn)
                    .await?
            }
            MembershipKind::ShoppingCart => {
                ShoppingCartRecipes::find()
                    .filter(shopping_cart_recipes::Column::UserId.eq(user.value()))
                    .filter(shopping_cart_recipes::Column::RecipeId.eq(recipe.value()))
                    .count(&self.conn)
                    .await?
            }
        };

        Ok(count > 0)
    }

    /// Insert the membership row. Returns `false` when it already existed,
    /// including when a concurrent insert wins the unique index.
    pub async fn add(&self, kind: MembershipKind, user: UserId, recipe: RecipeId) -> Result<bool> {
        if self.exists(kind, user, recipe).await? {
            return Ok(false);
        }

        let inserted = match kind {
            MembershipKind::Favorite => favorite_recipes::ActiveModel {
                user_id: Set(user.value()),
                recipe_id: Set(recipe.value()),
                ..Default::default()
            }
            .insert(&self.conn)
            .await
            .map(|_| ()),
            MembershipKind::ShoppingCart => shopping_cart_recipes::ActiveModel {
                user_id: Set(user.value()),
                recipe_id: Set(recipe.value()),
                ..Default::default()
            }
            .insert(&self.conn)
            .await
            .map(|_| ()),
        };

        match inserted {
            Ok(()) => Ok(true),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete the membership row. Returns `false` when there was none.
    pub async fn remove(
        &self,
        kind: MembershipKind,
        user: UserId,
        recipe: RecipeId,
    ) -> Result<bool> {
        let result = match kind {
            MembershipKind::Favorite => {
                FavoriteRecipes::delete_many()
                    .filter(favorite_recipes::Column::UserId.eq(user.value()))
                    .filter(favorite_recipes::Column::RecipeId.eq(recipe.value()))
                    .exec(&self.conn)
                    .await?
            }
            MembershipKind::ShoppingCart => {
                ShoppingCartRecipes::delete_many()
                    .filter(shopping_cart_recipes::Column::UserId.eq(user.value()))
                    .filter(shopping_cart_recipes::Column::RecipeId.eq(recipe.value()))
                    .exec(&self.conn)
                    .await?
            }
        };

        Ok(result.rows_affected > 0)
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
