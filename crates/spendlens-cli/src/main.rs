//! SpendLens CLI - Bank statement analyzer
//!
//! Usage:
//!   spendlens analyze --file statement.csv     Categorize and total a statement
//!   spendlens serve --port 3000                Start the upload API
//!   spendlens config                           Show thresholds and mappings
//!   spendlens health                           Check the classifier

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Analyze {
            file,
            format,
            categories,
            json,
        } => {
            let config = commands::load_config(config_path)?;
            let classifier = commands::classifier_from_env(&config)?;
            commands::cmd_analyze(
                config,
                classifier,
                &file,
                format.as_deref(),
                categories.as_deref(),
                json,
            )
            .await
        }
        Commands::Serve { port, host } => {
            let config = commands::load_config(config_path)?;
            let classifier = commands::classifier_from_env(&config)?;
            commands::cmd_serve(config, classifier, &host, port).await
        }
        Commands::Config => {
            let config = commands::load_config(config_path)?;
            commands::cmd_config(&config)
        }
        Commands::Health => {
            let config = commands::load_config(config_path)?;
            let classifier = commands::classifier_from_env(&config)?;
            commands::cmd_health(&classifier).await
        }
    }
}
