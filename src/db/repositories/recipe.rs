use std::collections::HashMap;

use crate::domain::{RecipeId, UserId};
use crate::entities::{
    favorite_recipes, ingredient_amounts, ingredients, prelude::*, recipe_tags, recipes,
    shopping_cart_recipes, tags, users,
};
use crate::models::PageRequest;
use crate::models::catalog::{Ingredient, Tag};
use crate::models::recipe::{
    IngredientAmountInput, IngredientLine, NewRecipe, Recipe, RecipeChanges, RecipeFilter,
    RecipeSummary, RecipeUpdate, ShoppingListLine,
};
use crate::models::user::User;
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Select, Set, TransactionTrait,
    sea_query::{Expr, Query},
};

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct ShoppingListRow {
    name: String,
    measurement_unit: String,
    total: i64,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the recipe row, its tag links and its ingredient lines atomically.
    pub async fn create(&self, recipe: NewRecipe) -> Result<RecipeId> {
        let txn = self.conn.begin().await?;

        let model = recipes::ActiveModel {
            author_id: Set(recipe.author_id.value()),
            name: Set(recipe.name),
            text: Set(recipe.text),
            image: Set(recipe.image),
            cooking_time: Set(recipe.cooking_time),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert recipe")?;

        replace_links(&txn, model.id, &recipe.tag_ids, &recipe.ingredients).await?;

        txn.commit().await?;
        Ok(RecipeId::new(model.id))
    }

    /// Apply `changes` and replace all links in one transaction.
    pub async fn update(&self, id: RecipeId, changes: RecipeChanges) -> Result<RecipeUpdate> {
        let txn = self.conn.begin().await?;

        let Some(existing) = Recipes::find_by_id(id.value()).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(RecipeUpdate::Missing);
        };

        let previous_image = existing.image.clone();
        let mut active: recipes::ActiveModel = existing.into();
        let mut replaced_image = None;

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(text) = changes.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = changes.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if let Some(image) = changes.image {
            if image != previous_image {
                replaced_image = Some(previous_image);
            }
            active.image = Set(image);
        }
        active.update(&txn).await.context("Failed to update recipe")?;

        replace_links(&txn, id.value(), &changes.tag_ids, &changes.ingredients).await?;

        txn.commit().await?;
        Ok(RecipeUpdate::Updated { replaced_image })
    }

    /// Delete a recipe. Links, favorites and cart rows go with it through
    /// `ON DELETE CASCADE`.
    pub async fn delete(&self, id: RecipeId) -> Result<bool> {
        let result = Recipes::delete_by_id(id.value()).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn exists(&self, id: RecipeId) -> Result<bool> {
        let count = Recipes::find_by_id(id.value()).count(&self.conn).await?;
        Ok(count > 0)
    }

    pub async fn get(&self, id: RecipeId) -> Result<Option<Recipe>> {
        let Some(row) = Recipes::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut loaded = self.load_aggregates(vec![row]).await?;
        Ok(loaded.pop())
    }

    pub async fn get_summary(&self, id: RecipeId) -> Result<Option<RecipeSummary>> {
        let row = Recipes::find_by_id(id.value()).one(&self.conn).await?;
        Ok(row.map(RecipeSummary::from))
    }

    pub async fn list(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Recipe>, u64)> {
        let paginator = filtered(filter)
            .order_by_desc(recipes::Column::Id)
            .paginate(&self.conn, page.limit);

        let total = paginator.num_items().await?;
        if !page.is_within(total) {
            return Ok((Vec::new(), total));
        }
        let rows = paginator.fetch_page(page.index()).await?;

        Ok((self.load_aggregates(rows).await?, total))
    }

    /// Newest recipes of `author`, at most `limit` when given.
    pub async fn list_by_author(
        &self,
        author: UserId,
        limit: Option<u64>,
    ) -> Result<Vec<RecipeSummary>> {
        let mut query = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author.value()))
            .order_by_desc(recipes::Column::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(RecipeSummary::from).collect())
    }

    pub async fn count_by_author(&self, author: UserId) -> Result<u64> {
        let count = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author.value()))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    /// Sum of amounts per (ingredient name, unit) over the user's cart.
    pub async fn shopping_list(&self, user: UserId) -> Result<Vec<ShoppingListLine>> {
        let in_cart = Query::select()
            .column(shopping_cart_recipes::Column::RecipeId)
            .from(ShoppingCartRecipes)
            .and_where(shopping_cart_recipes::Column::UserId.eq(user.value()))
            .to_owned();

        let rows = IngredientAmounts::find()
            .select_only()
            .column(ingredients::Column::Name)
            .column(ingredients::Column::MeasurementUnit)
            .column_as(
                Expr::col((IngredientAmounts, ingredient_amounts::Column::Amount)).sum(),
                "total",
            )
            .join(
                JoinType::InnerJoin,
                ingredient_amounts::Relation::Ingredient.def(),
            )
            .filter(ingredient_amounts::Column::RecipeId.in_subquery(in_cart))
            .group_by(ingredients::Column::Name)
            .group_by(ingredients::Column::MeasurementUnit)
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::MeasurementUnit)
            .into_model::<ShoppingListRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate shopping list")?;

        Ok(rows
            .into_iter()
            .map(|row| ShoppingListLine {
                name: row.name,
                measurement_unit: row.measurement_unit,
                total: row.total,
            })
            .collect())
    }

    async fn load_aggregates(&self, rows: Vec<recipes::Model>) -> Result<Vec<Recipe>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let author_ids: Vec<i32> = rows.iter().map(|r| r.author_id).collect();

        let authors: HashMap<i32, User> = Users::find()
            .filter(users::Column::Id.is_in(author_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|u| (u.id, User::from(u)))
            .collect();

        let mut tags_by_recipe: HashMap<i32, Vec<Tag>> = HashMap::new();
        let tag_links = RecipeTags::find()
            .find_also_related(Tags)
            .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.clone()))
            .order_by_asc(tags::Column::Id)
            .all(&self.conn)
            .await?;
        for (link, tag) in tag_links {
            if let Some(tag) = tag {
                tags_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(Tag::from(tag));
            }
        }

        let mut lines_by_recipe: HashMap<i32, Vec<IngredientLine>> = HashMap::new();
        let lines = IngredientAmounts::find()
            .find_also_related(Ingredients)
            .filter(ingredient_amounts::Column::RecipeId.is_in(recipe_ids))
            .order_by_asc(ingredient_amounts::Column::Id)
            .all(&self.conn)
            .await?;
        for (line, ingredient) in lines {
            if let Some(ingredient) = ingredient {
                lines_by_recipe
                    .entry(line.recipe_id)
                    .or_default()
                    .push(IngredientLine {
                        ingredient: Ingredient::from(ingredient),
                        amount: line.amount,
                    });
            }
        }

        rows.into_iter()
            .map(|row| {
                let author = authors
                    .get(&row.author_id)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("Author {} missing", row.author_id))?;

                Ok(Recipe {
                    id: RecipeId::new(row.id),
                    author,
                    tags: tags_by_recipe.remove(&row.id).unwrap_or_default(),
                    ingredients: lines_by_recipe.remove(&row.id).unwrap_or_default(),
                    name: row.name,
                    text: row.text,
                    image: row.image,
                    cooking_time: row.cooking_time,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}

fn filtered(filter: &RecipeFilter) -> Select<Recipes> {
    let mut query = Recipes::find();

    if let Some(author) = filter.author {
        query = query.filter(recipes::Column::AuthorId.eq(author.value()));
    }

    if !filter.tag_slugs.is_empty() {
        let tagged = Query::select()
            .column((RecipeTags, recipe_tags::Column::RecipeId))
            .from(RecipeTags)
            .inner_join(
                Tags,
                Expr::col((Tags, tags::Column::Id)).equals((RecipeTags, recipe_tags::Column::TagId)),
            )
            .and_where(Expr::col((Tags, tags::Column::Slug)).is_in(filter.tag_slugs.clone()))
            .to_owned();
        query = query.filter(recipes::Column::Id.in_subquery(tagged));
    }

    if let Some(user) = filter.favorited_by {
        let favorites = Query::select()
            .column(favorite_recipes::Column::RecipeId)
            .from(FavoriteRecipes)
            .and_where(favorite_recipes::Column::UserId.eq(user.value()))
            .to_owned();
        query = query.filter(recipes::Column::Id.in_subquery(favorites));
    }

    if let Some(user) = filter.in_cart_of {
        let cart = Query::select()
            .column(shopping_cart_recipes::Column::RecipeId)
            .from(ShoppingCartRecipes)
            .and_where(shopping_cart_recipes::Column::UserId.eq(user.value()))
            .to_owned();
        query = query.filter(recipes::Column::Id.in_subquery(cart));
    }

    query
}

/// Replace the tag set and ingredient lines of `recipe_id` wholesale.
async fn replace_links<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    tag_ids: &[i32],
    lines: &[IngredientAmountInput],
) -> Result<()> {
    RecipeTags::delete_many()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;

    IngredientAmounts::delete_many()
        .filter(ingredient_amounts::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;

    if !tag_ids.is_empty() {
        let links = tag_ids.iter().map(|tag_id| recipe_tags::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
        });
        RecipeTags::insert_many(links)
            .exec_without_returning(conn)
            .await
            .context("Failed to link recipe tags")?;
    }

    if !lines.is_empty() {
        let amounts = lines.iter().map(|line| ingredient_amounts::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(line.ingredient_id),
            amount: Set(line.amount),
            ..Default::default()
        });
        IngredientAmounts::insert_many(amounts)
            .exec_without_returning(conn)
            .await
            .context("Failed to insert ingredient amounts")?;
    }

    Ok(())
}
