use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, sea_query::Query,
};
use tokio::task;

use super::membership::is_unique_violation;
use crate::config::SecurityConfig;
use crate::domain::UserId;
use crate::entities::{auth_tokens, prelude::*, subscriptions, users};
use crate::models::PageRequest;
use crate::models::user::{NewUser, User};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user, hashing the password on a blocking thread.
    pub async fn create(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        let password = new_user.password.clone();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            email: Set(new_user.email),
            username: Set(new_user.username),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            password_hash: Set(password_hash),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Page of all users ordered by email, plus the total count.
    pub async fn list(&self, page: PageRequest) -> Result<(Vec<User>, u64)> {
        let paginator = Users::find()
            .order_by_asc(users::Column::Email)
            .paginate(&self.conn, page.limit);
        let total = paginator.num_items().await?;
        if !page.is_within(total) {
            return Ok((Vec::new(), total));
        }
        let items = paginator.fetch_page(page.index()).await?;

        Ok((items.into_iter().map(User::from).collect(), total))
    }

    /// Page of authors followed by `subscriber`, ordered by email.
    pub async fn list_followed(
        &self,
        subscriber: UserId,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64)> {
        let followed = Query::select()
            .column(subscriptions::Column::AuthorId)
            .from(Subscriptions)
            .and_where(subscriptions::Column::UserId.eq(subscriber.value()))
            .to_owned();

        let paginator = Users::find()
            .filter(users::Column::Id.in_subquery(followed))
            .order_by_asc(users::Column::Email)
            .paginate(&self.conn, page.limit);
        let total = paginator.num_items().await?;
        if !page.is_within(total) {
            return Ok((Vec::new(), total));
        }
        let items = paginator.fetch_page(page.index()).await?;

        Ok((items.into_iter().map(User::from).collect(), total))
    }

    /// Verify an email/password pair and return the user on success.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Check the password of a known user.
    pub async fn check_password(&self, id: UserId, password: &str) -> Result<bool> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password check")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password_hash = user.password_hash;
        let password = password.to_string();

        task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")?
    }

    pub async fn update_password(
        &self,
        id: UserId,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Return the user's token, creating one if none exists.
    /// `auth_tokens.user_id` is unique, so a concurrent login that inserted
    /// first wins and its key is returned.
    pub async fn get_or_create_token(&self, id: UserId) -> Result<String> {
        if let Some(existing) = self.token_of(id).await? {
            return Ok(existing);
        }

        let key = generate_token();
        let inserted = auth_tokens::ActiveModel {
            key: Set(key.clone()),
            user_id: Set(id.value()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        }
        .insert(&self.conn)
        .await;

        match inserted {
            Ok(_) => Ok(key),
            Err(e) if is_unique_violation(&e) => self
                .token_of(id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Auth token for user {id} vanished after conflict")),
            Err(e) => Err(e).context("Failed to insert auth token"),
        }
    }

    async fn token_of(&self, id: UserId) -> Result<Option<String>> {
        let token = AuthTokens::find()
            .filter(auth_tokens::Column::UserId.eq(id.value()))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?;
        Ok(token.map(|t| t.key))
    }

    pub async fn user_for_token(&self, key: &str) -> Result<Option<UserId>> {
        let token = AuthTokens::find_by_id(key.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?;

        Ok(token.map(|t| UserId::new(t.user_id)))
    }

    pub async fn delete_token(&self, id: UserId) -> Result<()> {
        AuthTokens::delete_many()
            .filter(auth_tokens::Column::UserId.eq(id.value()))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}

fn verify_hash(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random auth token (40 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();

    bytes.iter().fold(String::with_capacity(40), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
