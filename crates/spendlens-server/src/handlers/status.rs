//! Health and configuration handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use spendlens_core::ClassifierBackend;

#[derive(Debug, Serialize)]
pub struct ClassifierStatus {
    pub backend: &'static str,
    pub host: String,
    pub model: String,
    pub healthy: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub classifier: ClassifierStatus,
}

/// GET /api/health - Service and classifier status
///
/// Always 200 while the server is up; a down classifier is reported in the
/// body since uploads still succeed (as Uncategorized).
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let client = state.analyzer.classifier();
    let healthy = client.health_check().await;

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        classifier: ClassifierStatus {
            backend: client.backend_name(),
            host: client.host().to_string(),
            model: client.model().to_string(),
            healthy,
        },
    })
}

#[derive(Debug, Serialize)]
pub struct ClassifierLimits {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub concurrency: usize,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// Category -> limit, as decimal strings
    pub thresholds: BTreeMap<String, String>,
    /// Default override mapping
    pub categories: BTreeMap<String, String>,
    pub classifier: ClassifierLimits,
    pub debits_are_negative: bool,
    pub source: String,
}

/// GET /api/config - Effective analyzer configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let config = state.analyzer.config();

    Json(ConfigResponse {
        thresholds: config
            .thresholds
            .iter()
            .map(|(category, limit)| (category.to_string(), limit.to_string()))
            .collect(),
        categories: config
            .categories
            .sorted()
            .into_iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect(),
        classifier: ClassifierLimits {
            timeout_secs: config.classifier.timeout.as_secs(),
            max_retries: config.classifier.max_retries,
            concurrency: config.classifier.concurrency,
        },
        debits_are_negative: config.alerts.debits_are_negative,
        source: config.source.to_string(),
    })
}
