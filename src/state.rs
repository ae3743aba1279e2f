use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, ImageService, RecipeService, SeaOrmAuthService, SeaOrmRecipeService,
    SeaOrmUserService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub image_service: Arc<ImageService>,

    pub recipe_service: Arc<dyn RecipeService>,

    pub user_service: Arc<dyn UserService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let security = Arc::new(config.security.clone());
        let image_service = Arc::new(ImageService::new(&config.general.media_path));

        let recipe_service: Arc<dyn RecipeService> = Arc::new(SeaOrmRecipeService::new(
            store.clone(),
            image_service.clone(),
        ));
        let user_service: Arc<dyn UserService> =
            Arc::new(SeaOrmUserService::new(store.clone(), security.clone()));
        let auth_service: Arc<dyn AuthService> =
            Arc::new(SeaOrmAuthService::new(store.clone(), security));

        Self {
            config: Arc::new(config),
            store,
            image_service,
            recipe_service,
            user_service,
            auth_service,
        }
    }
}
