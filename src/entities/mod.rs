pub mod prelude;

pub mod auth_tokens;
pub mod favorite_recipes;
pub mod ingredient_amounts;
pub mod ingredients;
pub mod recipe_tags;
pub mod recipes;
pub mod shopping_cart_recipes;
pub mod subscriptions;
pub mod tags;
pub mod users;
