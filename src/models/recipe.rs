use crate::domain::{RecipeId, UserId};
use crate::entities::recipes;
use crate::models::catalog::{Ingredient, Tag};
use crate::models::user::User;

/// Full recipe aggregate: the row plus author, tag set and ingredient lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub author: User,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub created_at: String,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<IngredientLine>,
}

/// Minimal recipe data used by toggle responses and subscription feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<recipes::Model> for RecipeSummary {
    fn from(model: recipes::Model) -> Self {
        Self {
            id: RecipeId::new(model.id),
            name: model.name,
            image: model.image,
            cooking_time: model.cooking_time,
        }
    }
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub ingredient: Ingredient,
    pub amount: i32,
}

/// Requested ingredient line on the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmountInput {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// Validated data for inserting a recipe. `image` is already stored.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmountInput>,
}

/// Validated update. Tags and ingredients always replace the existing
/// associations wholesale; scalar fields are kept when `None`.
#[derive(Debug, Clone)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmountInput>,
}

/// Result of applying [`RecipeChanges`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeUpdate {
    /// The recipe was gone by the time the transaction ran.
    Missing,
    /// Holds the previous image path when a new image replaced it.
    Updated { replaced_image: Option<String> },
}

/// List filters. Membership filters are only set for authenticated viewers
/// asking for `1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<UserId>,
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<UserId>,
    pub in_cart_of: Option<UserId>,
}

/// One aggregated shopping-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}
