//! Statement upload handler

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use spendlens_core::{resolve_format, AnalysisReport};

/// Query parameters for an upload
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Override mapping, `from:to,from:to`
    #[serde(rename = "customCategories")]
    pub custom_categories: Option<String>,
}

/// POST /api/upload - Analyze an uploaded statement
///
/// Expects multipart form with:
/// - file: CSV or PDF statement (required, max 10MB)
/// - format: `csv` or `pdf` (optional, defaults to the file name's extension)
pub async fn upload_statement(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut declared_format: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::bad_request("invalid_upload", &format!("Failed to read form field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|_| {
                    AppError::bad_request("invalid_upload", "Failed to read file data")
                })?;

                if bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(AppError::payload_too_large(&format!(
                        "File too large. Maximum size is {} MB",
                        MAX_UPLOAD_SIZE / 1024 / 1024
                    )));
                }

                file_data = Some(bytes.to_vec());
            }
            "format" => {
                let value = field.text().await.map_err(|_| {
                    AppError::bad_request("invalid_upload", "Failed to read format")
                })?;
                if !value.trim().is_empty() {
                    declared_format = Some(value);
                }
            }
            _ => {}
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::bad_request("invalid_upload", "Missing file field"))?;
    let format = resolve_format(declared_format.as_deref(), file_name.as_deref())?;

    debug!(
        file = file_name.as_deref().unwrap_or("<unnamed>"),
        format = %format,
        bytes = file_data.len(),
        "Received statement upload"
    );

    let report = state
        .analyzer
        .analyze(&file_data, format, params.custom_categories.as_deref())
        .await?;

    info!(
        transactions = report.stats.transactions,
        alerts = report.alerts.len(),
        warnings = report.warnings.len(),
        "Upload analyzed"
    );

    Ok(Json(report))
}
