//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SpendLens - Categorize bank statements and flag overspending
#[derive(Parser)]
#[command(name = "spendlens")]
#[command(about = "Bank statement categorizer and overspending alerts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $SPENDLENS_CONFIG, then ~/.config/spendlens/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a CSV or PDF statement
    Analyze {
        /// Statement file
        #[arg(short, long)]
        file: PathBuf,

        /// Statement format: csv or pdf (detected from the extension if not specified)
        #[arg(long)]
        format: Option<String>,

        /// Category overrides, e.g. "groceries:Food & Dining,rent:Housing"
        #[arg(short, long)]
        categories: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the upload API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Show the effective configuration
    Config,

    /// Check the classifier connection
    Health,
}
