//! CLI module - Command-line interface for Foodgram
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Foodgram - recipe sharing backend
#[derive(Parser)]
#[command(name = "foodgram")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    #[command(alias = "web")]
    Serve,

    /// Load the ingredient catalog from a `name,unit` CSV file
    #[command(alias = "load_ingredients")]
    LoadIngredients {
        /// CSV path, defaults to `import.ingredients_csv`
        path: Option<PathBuf>,
    },

    /// Load tags from a `name,color,slug` CSV file
    #[command(alias = "load_tags")]
    LoadTags {
        /// CSV path, defaults to `import.tags_csv`
        path: Option<PathBuf>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
