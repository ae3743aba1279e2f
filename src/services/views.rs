//! View-model construction.
//!
//! Every builder takes the request [`Viewer`] explicitly and derives the
//! membership flags for that viewer only. Anonymous viewers always get
//! `false` and cost no queries.

use anyhow::Result;
use std::fmt::Write;

use crate::api::types::{
    IngredientAmountDto, IngredientDto, RecipeDto, RecipeMinifiedDto, SubscriptionDto, TagDto,
    UserCreatedDto, UserDto,
};
use crate::db::{MembershipKind, Store};
use crate::domain::Viewer;
use crate::models::catalog::{Ingredient, Tag};
use crate::models::recipe::{Recipe, RecipeSummary, ShoppingListLine};
use crate::models::user::User;
use crate::services::ImageService;

#[must_use]
pub fn tag_view(tag: &Tag) -> TagDto {
    TagDto {
        id: tag.id,
        name: tag.name.clone(),
        color: tag.color.clone(),
        slug: tag.slug.clone(),
    }
}

#[must_use]
pub fn ingredient_view(ingredient: &Ingredient) -> IngredientDto {
    IngredientDto {
        id: ingredient.id,
        name: ingredient.name.clone(),
        measurement_unit: ingredient.measurement_unit.clone(),
    }
}

#[must_use]
pub fn user_created_view(user: &User) -> UserCreatedDto {
    UserCreatedDto {
        id: user.id.value(),
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

pub async fn user_view(store: &Store, viewer: Viewer, user: &User) -> Result<UserDto> {
    let is_subscribed = match viewer.user_id() {
        Some(me) => store.is_subscribed(me, user.id).await?,
        None => false,
    };

    Ok(UserDto {
        id: user.id.value(),
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
    })
}

#[must_use]
pub fn recipe_summary_view(recipe: &RecipeSummary) -> RecipeMinifiedDto {
    RecipeMinifiedDto {
        id: recipe.id.value(),
        name: recipe.name.clone(),
        image: ImageService::url_for(&recipe.image),
        cooking_time: recipe.cooking_time,
    }
}

pub async fn recipe_view(store: &Store, viewer: Viewer, recipe: &Recipe) -> Result<RecipeDto> {
    let (is_favorited, is_in_shopping_cart) = match viewer.user_id() {
        Some(me) => (
            store
                .has_membership(MembershipKind::Favorite, me, recipe.id)
                .await?,
            store
                .has_membership(MembershipKind::ShoppingCart, me, recipe.id)
                .await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDto {
        id: recipe.id.value(),
        tags: recipe.tags.iter().map(tag_view).collect(),
        author: user_view(store, viewer, &recipe.author).await?,
        ingredients: recipe
            .ingredients
            .iter()
            .map(|line| IngredientAmountDto {
                id: line.ingredient.id,
                name: line.ingredient.name.clone(),
                measurement_unit: line.ingredient.measurement_unit.clone(),
                amount: line.amount,
            })
            .collect(),
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name.clone(),
        image: ImageService::url_for(&recipe.image),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
    })
}

/// Author card for the subscriptions feed: profile, newest recipes and the
/// total recipe count.
pub async fn subscription_view(
    store: &Store,
    viewer: Viewer,
    author: &User,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionDto> {
    let recipes = store
        .list_recipes_by_author(author.id, recipes_limit)
        .await?;
    let recipes_count = store.count_recipes_by_author(author.id).await?;

    Ok(SubscriptionDto {
        user: user_view(store, viewer, author).await?,
        recipes: recipes.iter().map(recipe_summary_view).collect(),
        recipes_count,
    })
}

/// Plain-text shopping list, one `- <name>, <unit> - <total>` line per
/// aggregated ingredient.
#[must_use]
pub fn render_shopping_list(username: &str, lines: &[ShoppingListLine]) -> String {
    let mut out = format!("Shopping list for {username}\n\n");
    for line in lines {
        let _ = writeln!(
            out,
            "- {}, {} - {}",
            line.name, line.measurement_unit, line.total
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, total: i64) -> ShoppingListLine {
        ShoppingListLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total,
        }
    }

    #[test]
    fn test_render_shopping_list() {
        let text = render_shopping_list(
            "chef",
            &[line("Flour", "g", 500), line("Salt", "g", 15)],
        );

        assert!(text.starts_with("Shopping list for chef\n"));
        assert!(text.contains("- Flour, g - 500\n"));
        assert!(text.contains("- Salt, g - 15\n"));
        assert_eq!(text.matches("- Salt").count(), 1);
    }

    #[test]
    fn test_render_empty_list_has_header_only() {
        let text = render_shopping_list("chef", &[]);
        assert_eq!(text, "Shopping list for chef\n\n");
    }
}
