//! SpendLens Core Library
//!
//! Shared functionality for the SpendLens statement analyzer:
//! - CSV and PDF statement parsers
//! - Pluggable transaction classifiers (Ollama, mock)
//! - Categorization with fallback labels and override mappings
//! - Per-category totals and threshold alerts
//! - Layered TOML configuration

pub mod ai;
pub mod alerts;
pub mod categorize;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod summary;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{ClassifierBackend, ClassifierClient, MockBackend, OllamaBackend, Prediction, RetrievedContext};
pub use alerts::{evaluate_alerts, AlertSettings};
pub use categorize::{CategorizationOutcome, Categorizer, ClassifierSettings};
pub use config::{AnalyzerConfig, ConfigSource};
pub use error::{Error, Result};
pub use import::{parse_statement, DatedLinePattern, LineParser, ParsedStatement};
pub use models::*;
pub use pipeline::{resolve_format, StatementAnalyzer};
pub use summary::summarize;
