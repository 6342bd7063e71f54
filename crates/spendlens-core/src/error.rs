//! Error types for SpendLens

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported statement format: {0}")]
    UnsupportedFormat(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Malformed amount in row {row}: {value:?}")]
    MalformedAmount { row: usize, value: String },

    #[error("Malformed date in row {row}: {value:?}")]
    MalformedDate { row: usize, value: String },

    #[error("Invalid category mapping: {0}")]
    InvalidCategoryMapping(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("PDF extraction error: {0}")]
    Pdf(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Classifier call timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Stable identifier reported to callers alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::MissingColumn(_) => "missing_column",
            Self::MalformedAmount { .. } => "malformed_amount",
            Self::MalformedDate { .. } => "malformed_date",
            Self::InvalidCategoryMapping(_) => "invalid_category_mapping",
            Self::Csv(_) => "csv",
            Self::Pdf(_) => "pdf",
            Self::Classifier(_) => "classifier_failure",
            Self::Timeout(_) => "timeout",
            Self::Http(_) => "http",
            Self::Json(_) => "json",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::InvalidData(_) => "invalid_data",
        }
    }

    /// Whether the failure is worth retrying (timeouts, network errors, 5xx)
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(e) => e.status().map_or(true, |s| s.is_server_error()),
            _ => false,
        }
    }

    /// Whether the error was caused by the uploaded input rather than the service
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_)
                | Self::MissingColumn(_)
                | Self::MalformedAmount { .. }
                | Self::MalformedDate { .. }
                | Self::InvalidCategoryMapping(_)
                | Self::Csv(_)
                | Self::Pdf(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
