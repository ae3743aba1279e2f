//! Bulk loading of the ingredient and tag catalogs from CSV files.
//!
//! Files have no header row. Ingredients are `name,measurement_unit`,
//! tags are `name,color,slug`. Any malformed row aborts the whole load.

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::api::validation::{is_hex_color, is_slug};
use crate::db::Store;
use crate::models::catalog::{ImportStats, IngredientRecord, TagRecord};

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

pub fn parse_ingredients<R: Read>(input: R) -> Result<Vec<IngredientRecord>> {
    let mut records = Vec::new();

    for (index, row) in reader(input).records().enumerate() {
        let line = index + 1;
        let row = row.with_context(|| format!("Row {line}: unreadable CSV"))?;

        if row.iter().all(str::is_empty) {
            continue;
        }
        if row.len() != 2 {
            bail!("Row {line}: expected 2 columns, found {}", row.len());
        }

        let name = &row[0];
        let unit = &row[1];
        if name.is_empty() || unit.is_empty() {
            bail!("Row {line}: name and measurement unit are required");
        }

        records.push(IngredientRecord {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        });
    }

    Ok(records)
}

pub fn parse_tags<R: Read>(input: R) -> Result<Vec<TagRecord>> {
    let mut records = Vec::new();

    for (index, row) in reader(input).records().enumerate() {
        let line = index + 1;
        let row = row.with_context(|| format!("Row {line}: unreadable CSV"))?;

        if row.iter().all(str::is_empty) {
            continue;
        }
        if row.len() != 3 {
            bail!("Row {line}: expected 3 columns, found {}", row.len());
        }

        let (name, color, slug) = (&row[0], &row[1], &row[2]);
        if name.is_empty() {
            bail!("Row {line}: tag name is required");
        }
        if !is_hex_color(color) {
            bail!("Row {line}: invalid color '{color}'");
        }
        if !is_slug(slug) {
            bail!("Row {line}: invalid slug '{slug}'");
        }

        records.push(TagRecord {
            name: name.to_string(),
            color: color.to_uppercase(),
            slug: slug.to_string(),
        });
    }

    Ok(records)
}

pub async fn load_ingredients(store: &Store, path: &Path) -> Result<ImportStats> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let records = parse_ingredients(file)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    info!(path = %path.display(), rows = records.len(), "Loading ingredients");
    store.upsert_ingredients(records).await
}

pub async fn load_tags(store: &Store, path: &Path) -> Result<ImportStats> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let records =
        parse_tags(file).with_context(|| format!("Failed to parse {}", path.display()))?;

    info!(path = %path.display(), rows = records.len(), "Loading tags");
    store.upsert_tags(records).await
}
