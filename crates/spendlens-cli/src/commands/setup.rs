//! Shared command setup
//!
//! - `load_config` - Resolve and load the analyzer configuration
//! - `classifier_from_env` - Build the classifier selected by the environment

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use spendlens_core::{AnalyzerConfig, ClassifierClient};

/// Load configuration from `--config`, `$SPENDLENS_CONFIG`, the user file, or built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    AnalyzerConfig::load(path).context("Failed to load configuration")
}

/// Classifier from `CLASSIFIER_BACKEND` / `OLLAMA_HOST`, with the configured category hints
pub fn classifier_from_env(config: &AnalyzerConfig) -> Result<ClassifierClient> {
    let client = ClassifierClient::from_env().ok_or_else(|| {
        anyhow!(
            "No classifier configured. Set OLLAMA_HOST (e.g. http://localhost:11434), \
             or CLASSIFIER_BACKEND=mock for keyword-based classification"
        )
    })?;

    Ok(match client {
        ClassifierClient::Ollama(backend) => {
            ClassifierClient::Ollama(backend.with_category_hints(config.category_hints.clone()))
        }
        other => other,
    })
}
