use crate::entities::prelude::*;
use crate::entities::{favorite_recipes, shopping_cart_recipes, subscriptions};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Favorites
        manager
            .create_table(
                schema
                    .create_table_from_entity(FavoriteRecipes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_favorite_recipes_user_recipe")
                    .table(FavoriteRecipes)
                    .col(favorite_recipes::Column::UserId)
                    .col(favorite_recipes::Column::RecipeId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Shopping cart
        manager
            .create_table(
                schema
                    .create_table_from_entity(ShoppingCartRecipes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shopping_cart_recipes_user_recipe")
                    .table(ShoppingCartRecipes)
                    .col(shopping_cart_recipes::Column::UserId)
                    .col(shopping_cart_recipes::Column::RecipeId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Subscriptions
        manager
            .create_table(
                schema
                    .create_table_from_entity(Subscriptions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_user_author")
                    .table(Subscriptions)
                    .col(subscriptions::Column::UserId)
                    .col(subscriptions::Column::AuthorId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShoppingCartRecipes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FavoriteRecipes).to_owned())
            .await
    }
}
