pub mod catalog_import;
pub mod image;
pub mod views;

pub use image::ImageService;

pub mod recipe_service;
pub mod recipe_service_impl;
pub use recipe_service::{CreateRecipe, RecipeError, RecipeService, UpdateRecipe};
pub use recipe_service_impl::SeaOrmRecipeService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;
