use crate::config::SecurityConfig;
use crate::domain::{RecipeId, UserId};
use crate::models::PageRequest;
use crate::models::catalog::{ImportStats, Ingredient, IngredientRecord, Tag, TagRecord};
use crate::models::recipe::{
    NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipeSummary, RecipeUpdate, ShoppingListLine,
};
use crate::models::user::{NewUser, User};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::membership::MembershipKind;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite:")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::ingredient::IngredientRepository {
        repositories::ingredient::IngredientRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn membership_repo(&self) -> repositories::membership::MembershipRepository {
        repositories::membership::MembershipRepository::new(self.conn.clone())
    }

    fn subscription_repo(&self) -> repositories::subscription::SubscriptionRepository {
        repositories::subscription::SubscriptionRepository::new(self.conn.clone())
    }

    // Users & tokens

    pub async fn create_user(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        self.user_repo().email_taken(email).await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        self.user_repo().username_taken(username).await
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<(Vec<User>, u64)> {
        self.user_repo().list(page).await
    }

    pub async fn list_followed_authors(
        &self,
        subscriber: UserId,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64)> {
        self.user_repo().list_followed(subscriber, page).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn check_user_password(&self, id: UserId, password: &str) -> Result<bool> {
        self.user_repo().check_password(id, password).await
    }

    pub async fn update_user_password(
        &self,
        id: UserId,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, config)
            .await
    }

    pub async fn get_or_create_token(&self, id: UserId) -> Result<String> {
        self.user_repo().get_or_create_token(id).await
    }

    pub async fn user_for_token(&self, key: &str) -> Result<Option<UserId>> {
        self.user_repo().user_for_token(key).await
    }

    pub async fn delete_token(&self, id: UserId) -> Result<()> {
        self.user_repo().delete_token(id).await
    }

    // Catalogs

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.tag_repo().list().await
    }

    pub async fn get_tag(&self, id: i32) -> Result<Option<Tag>> {
        self.tag_repo().get(id).await
    }

    pub async fn existing_tag_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        self.tag_repo().existing_ids(ids).await
    }

    pub async fn upsert_tags(&self, records: Vec<TagRecord>) -> Result<ImportStats> {
        self.tag_repo().upsert_many(records).await
    }

    pub async fn search_ingredients(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>> {
        self.ingredient_repo().search(prefix).await
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<Ingredient>> {
        self.ingredient_repo().get(id).await
    }

    pub async fn existing_ingredient_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        self.ingredient_repo().existing_ids(ids).await
    }

    pub async fn upsert_ingredients(&self, records: Vec<IngredientRecord>) -> Result<ImportStats> {
        self.ingredient_repo().upsert_many(records).await
    }

    // Recipes

    pub async fn create_recipe(&self, recipe: NewRecipe) -> Result<RecipeId> {
        self.recipe_repo().create(recipe).await
    }

    pub async fn update_recipe(
        &self,
        id: RecipeId,
        changes: RecipeChanges,
    ) -> Result<RecipeUpdate> {
        self.recipe_repo().update(id, changes).await
    }

    pub async fn delete_recipe(&self, id: RecipeId) -> Result<bool> {
        self.recipe_repo().delete(id).await
    }

    pub async fn recipe_exists(&self, id: RecipeId) -> Result<bool> {
        self.recipe_repo().exists(id).await
    }

    pub async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
        self.recipe_repo().get(id).await
    }

    pub async fn get_recipe_summary(&self, id: RecipeId) -> Result<Option<RecipeSummary>> {
        self.recipe_repo().get_summary(id).await
    }

    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Recipe>, u64)> {
        self.recipe_repo().list(filter, page).await
    }

    pub async fn list_recipes_by_author(
        &self,
        author: UserId,
        limit: Option<u64>,
    ) -> Result<Vec<RecipeSummary>> {
        self.recipe_repo().list_by_author(author, limit).await
    }

    pub async fn count_recipes_by_author(&self, author: UserId) -> Result<u64> {
        self.recipe_repo().count_by_author(author).await
    }

    pub async fn shopping_list(&self, user: UserId) -> Result<Vec<ShoppingListLine>> {
        self.recipe_repo().shopping_list(user).await
    }

    // Memberships

    pub async fn has_membership(
        &self,
        kind: MembershipKind,
        user: UserId,
        recipe: RecipeId,
    ) -> Result<bool> {
        self.membership_repo().exists(kind, user, recipe).await
    }

    pub async fn add_membership(
        &self,
        kind: MembershipKind,
        user: UserId,
        recipe: RecipeId,
    ) -> Result<bool> {
        self.membership_repo().add(kind, user, recipe).await
    }

    pub async fn remove_membership(
        &self,
        kind: MembershipKind,
        user: UserId,
        recipe: RecipeId,
    ) -> Result<bool> {
        self.membership_repo().remove(kind, user, recipe).await
    }

    pub async fn is_subscribed(&self, user: UserId, author: UserId) -> Result<bool> {
        self.subscription_repo().exists(user, author).await
    }

    pub async fn subscribe(&self, user: UserId, author: UserId) -> Result<bool> {
        self.subscription_repo().add(user, author).await
    }

    pub async fn unsubscribe(&self, user: UserId, author: UserId) -> Result<bool> {
        self.subscription_repo().remove(user, author).await
    }
}
