//! Catalog load command handlers

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db::Store;
use crate::models::catalog::ImportStats;
use crate::services::catalog_import;

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

fn report(kind: &str, path: &Path, stats: ImportStats) {
    println!("Loaded {kind} from {}", path.display());
    println!("  created:   {}", stats.created);
    println!("  updated:   {}", stats.updated);
    println!("  unchanged: {}", stats.unchanged);
}

pub async fn cmd_load_ingredients(config: &Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(&config.import.ingredients_csv));
    let store = open_store(config).await?;

    let stats = catalog_import::load_ingredients(&store, &path).await?;
    report("ingredients", &path, stats);
    Ok(())
}

pub async fn cmd_load_tags(config: &Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(&config.import.tags_csv));
    let store = open_store(config).await?;

    let stats = catalog_import::load_tags(&store, &path).await?;
    report("tags", &path, stats);
    Ok(())
}
