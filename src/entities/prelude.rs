pub use super::auth_tokens::Entity as AuthTokens;
pub use super::favorite_recipes::Entity as FavoriteRecipes;
pub use super::ingredient_amounts::Entity as IngredientAmounts;
pub use super::ingredients::Entity as Ingredients;
pub use super::recipe_tags::Entity as RecipeTags;
pub use super::recipes::Entity as Recipes;
pub use super::shopping_cart_recipes::Entity as ShoppingCartRecipes;
pub use super::subscriptions::Entity as Subscriptions;
pub use super::tags::Entity as Tags;
pub use super::users::Entity as Users;
