use crate::entities::{ingredients, prelude::*};
use crate::models::catalog::{ImportStats, Ingredient, IngredientRecord};
use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::LikeExpr,
};

pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All ingredients ordered by name, optionally narrowed to a
    /// case-insensitive name prefix.
    pub async fn search(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>> {
        let mut query = Ingredients::find()
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::MeasurementUnit);

        if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
            let pattern = format!("{}%", escape_like(&search_key(prefix)));
            query = query
                .filter(ingredients::Column::SearchName.like(LikeExpr::new(pattern).escape('\\')));
        }

        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Ingredient>> {
        let row = Ingredients::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Ingredient::from))
    }

    /// Returns the subset of `ids` that exist.
    pub async fn existing_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Ingredients::find()
            .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|i| i.id).collect())
    }

    /// Insert ingredients that are not yet known by `(name, unit)`.
    /// Runs in one transaction so a failing row leaves the catalog untouched.
    pub async fn upsert_many(&self, records: Vec<IngredientRecord>) -> Result<ImportStats> {
        let txn = self.conn.begin().await?;
        let mut stats = ImportStats::default();

        for record in records {
            let existing = Ingredients::find()
                .filter(ingredients::Column::Name.eq(&record.name))
                .filter(ingredients::Column::MeasurementUnit.eq(&record.measurement_unit))
                .one(&txn)
                .await
                .with_context(|| format!("Failed to look up ingredient '{}'", record.name))?;

            if existing.is_some() {
                stats.unchanged += 1;
                continue;
            }

            Ingredients::insert(ingredients::ActiveModel {
                search_name: Set(search_key(&record.name)),
                name: Set(record.name),
                measurement_unit: Set(record.measurement_unit),
                ..Default::default()
            })
            .exec(&txn)
            .await?;
            stats.created += 1;
        }

        txn.commit().await?;
        Ok(stats)
    }
}

fn search_key(name: &str) -> String {
    name.to_lowercase()
}

/// Escape `LIKE` metacharacters so user input only ever matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
