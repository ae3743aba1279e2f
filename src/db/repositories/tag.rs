use crate::entities::{prelude::*, tags};
use crate::models::catalog::{ImportStats, Tag, TagRecord};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<Tag>> {
        let rows = Tags::find()
            .order_by_desc(tags::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Tag>> {
        let row = Tags::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Tag::from))
    }

    /// Returns the subset of `ids` that exist.
    pub async fn existing_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Tags::find()
            .filter(tags::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|t| t.id).collect())
    }

    /// Insert or update tags by slug in a single transaction.
    pub async fn upsert_many(&self, records: Vec<TagRecord>) -> Result<ImportStats> {
        let txn = self.conn.begin().await?;
        let mut stats = ImportStats::default();

        for record in records {
            let existing = Tags::find()
                .filter(tags::Column::Slug.eq(&record.slug))
                .one(&txn)
                .await
                .with_context(|| format!("Failed to look up tag '{}'", record.slug))?;

            match existing {
                Some(row) if row.name == record.name && row.color == record.color => {
                    stats.unchanged += 1;
                }
                Some(row) => {
                    let mut active: tags::ActiveModel = row.into();
                    active.name = Set(record.name);
                    active.color = Set(record.color);
                    active.update(&txn).await?;
                    stats.updated += 1;
                }
                None => {
                    tags::ActiveModel {
                        name: Set(record.name),
                        color: Set(record.color),
                        slug: Set(record.slug),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                    stats.created += 1;
                }
            }
        }

        txn.commit().await?;
        Ok(stats)
    }
}
