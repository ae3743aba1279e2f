//! `SeaORM` implementation of the `RecipeService` trait.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::api::types::{RecipeDto, RecipeMinifiedDto};
use crate::db::{MembershipKind, Store};
use crate::domain::{RecipeId, UserId, Viewer};
use crate::models::PageRequest;
use crate::models::recipe::{
    IngredientAmountInput, NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipeUpdate,
};
use crate::services::image::{ImageError, ImageService};
use crate::services::recipe_service::{CreateRecipe, RecipeError, RecipeService, UpdateRecipe};
use crate::services::views;

pub struct SeaOrmRecipeService {
    store: Store,
    images: Arc<ImageService>,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }

    async fn load(&self, id: RecipeId) -> Result<Recipe, RecipeError> {
        self.store
            .get_recipe(id)
            .await?
            .ok_or(RecipeError::NotFound(id))
    }

    /// Reject tag and ingredient ids that do not exist.
    async fn check_references(
        &self,
        tag_ids: &[i32],
        ingredients: &[IngredientAmountInput],
    ) -> Result<(), RecipeError> {
        let known: HashSet<i32> = self
            .store
            .existing_tag_ids(tag_ids)
            .await?
            .into_iter()
            .collect();
        if let Some(missing) = tag_ids.iter().find(|id| !known.contains(id)) {
            return Err(RecipeError::validation(
                "tags",
                format!("Tag {missing} does not exist"),
            ));
        }

        let ingredient_ids: Vec<i32> = ingredients.iter().map(|i| i.ingredient_id).collect();
        let known: HashSet<i32> = self
            .store
            .existing_ingredient_ids(&ingredient_ids)
            .await?
            .into_iter()
            .collect();
        if let Some(missing) = ingredient_ids.iter().find(|id| !known.contains(id)) {
            return Err(RecipeError::validation(
                "ingredients",
                format!("Ingredient {missing} does not exist"),
            ));
        }

        Ok(())
    }

    async fn store_image(&self, data_uri: &str) -> Result<String, RecipeError> {
        self.images
            .save_data_uri(data_uri)
            .await
            .map_err(|e| match e {
                ImageError::Invalid(msg) => RecipeError::validation("image", msg),
                ImageError::Io(msg) => RecipeError::Internal(msg),
            })
    }

    async fn ensure_exists(&self, id: RecipeId) -> Result<(), RecipeError> {
        if self.store.recipe_exists(id).await? {
            Ok(())
        } else {
            Err(RecipeError::NotFound(id))
        }
    }
}

const fn membership_label(kind: MembershipKind) -> &'static str {
    match kind {
        MembershipKind::Favorite => "favorites",
        MembershipKind::ShoppingCart => "the shopping cart",
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(
        &self,
        viewer: Viewer,
        filter: RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<RecipeDto>, u64), RecipeError> {
        let (recipes, total) = self.store.list_recipes(&filter, page).await?;

        let mut dtos = Vec::with_capacity(recipes.len());
        for recipe in &recipes {
            dtos.push(views::recipe_view(&self.store, viewer, recipe).await?);
        }

        Ok((dtos, total))
    }

    async fn get(&self, viewer: Viewer, id: RecipeId) -> Result<RecipeDto, RecipeError> {
        let recipe = self.load(id).await?;
        Ok(views::recipe_view(&self.store, viewer, &recipe).await?)
    }

    async fn create(&self, author: UserId, input: CreateRecipe) -> Result<RecipeDto, RecipeError> {
        self.check_references(&input.tag_ids, &input.ingredients)
            .await?;

        let image = self.store_image(&input.image).await?;

        let created = self
            .store
            .create_recipe(NewRecipe {
                author_id: author,
                name: input.name,
                text: input.text,
                image: image.clone(),
                cooking_time: input.cooking_time,
                tag_ids: input.tag_ids,
                ingredients: input.ingredients,
            })
            .await;

        let id = match created {
            Ok(id) => id,
            Err(e) => {
                self.images.remove(&image).await;
                return Err(e.into());
            }
        };

        info!(recipe_id = %id, author_id = %author, "Recipe created");

        let recipe = self.load(id).await?;
        Ok(views::recipe_view(&self.store, Viewer::User(author), &recipe).await?)
    }

    async fn update(
        &self,
        editor: UserId,
        id: RecipeId,
        input: UpdateRecipe,
    ) -> Result<RecipeDto, RecipeError> {
        let current = self.load(id).await?;
        if current.author.id != editor {
            return Err(RecipeError::Forbidden);
        }

        self.check_references(&input.tag_ids, &input.ingredients)
            .await?;

        let new_image = match input.image.as_deref() {
            Some(data_uri) => Some(self.store_image(data_uri).await?),
            None => None,
        };

        let updated = self
            .store
            .update_recipe(
                id,
                RecipeChanges {
                    name: input.name,
                    text: input.text,
                    image: new_image.clone(),
                    cooking_time: input.cooking_time,
                    tag_ids: input.tag_ids,
                    ingredients: input.ingredients,
                },
            )
            .await;

        match updated {
            Ok(RecipeUpdate::Updated {
                replaced_image: Some(previous_image),
            }) => self.images.remove(&previous_image).await,
            Ok(RecipeUpdate::Updated {
                replaced_image: None,
            }) => {}
            Ok(RecipeUpdate::Missing) => {
                if let Some(image) = new_image {
                    self.images.remove(&image).await;
                }
                return Err(RecipeError::NotFound(id));
            }
            Err(e) => {
                if let Some(image) = new_image {
                    self.images.remove(&image).await;
                }
                return Err(e.into());
            }
        }

        info!(recipe_id = %id, "Recipe updated");

        let recipe = self.load(id).await?;
        Ok(views::recipe_view(&self.store, Viewer::User(editor), &recipe).await?)
    }

    async fn delete(&self, editor: UserId, id: RecipeId) -> Result<(), RecipeError> {
        let current = self.load(id).await?;
        if current.author.id != editor {
            return Err(RecipeError::Forbidden);
        }

        if !self.store.delete_recipe(id).await? {
            return Err(RecipeError::NotFound(id));
        }

        self.images.remove(&current.image).await;
        info!(recipe_id = %id, "Recipe deleted");
        Ok(())
    }

    async fn add_membership(
        &self,
        kind: MembershipKind,
        user: UserId,
        id: RecipeId,
    ) -> Result<RecipeMinifiedDto, RecipeError> {
        let summary = self
            .store
            .get_recipe_summary(id)
            .await?
            .ok_or(RecipeError::NotFound(id))?;

        if !self.store.add_membership(kind, user, id).await? {
            return Err(RecipeError::Conflict(format!(
                "Recipe is already in {}",
                membership_label(kind)
            )));
        }

        info!(recipe_id = %id, user_id = %user, kind = kind.as_str(), "Membership added");
        Ok(views::recipe_summary_view(&summary))
    }

    async fn remove_membership(
        &self,
        kind: MembershipKind,
        user: UserId,
        id: RecipeId,
    ) -> Result<(), RecipeError> {
        self.ensure_exists(id).await?;

        if !self.store.remove_membership(kind, user, id).await? {
            return Err(RecipeError::Conflict(format!(
                "Recipe is not in {}",
                membership_label(kind)
            )));
        }

        info!(recipe_id = %id, user_id = %user, kind = kind.as_str(), "Membership removed");
        Ok(())
    }

    async fn shopping_list(&self, user: UserId) -> Result<String, RecipeError> {
        let lines = self.store.shopping_list(user).await?;
        if lines.is_empty() {
            return Err(RecipeError::EmptyCart);
        }

        let Some(owner) = self.store.get_user(user).await? else {
            warn!(user_id = %user, "Shopping list requested for a missing user");
            return Err(RecipeError::Internal(format!("User {user} not found")));
        };

        Ok(views::render_shopping_list(&owner.username, &lines))
    }
}
