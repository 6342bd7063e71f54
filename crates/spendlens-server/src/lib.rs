//! SpendLens Web Server
//!
//! Axum-based upload API: post a bank statement, get back per-category totals
//! and overspending alerts.
//!
//! - Input validation (file size limit, declared format, mapping syntax)
//! - Restrictive CORS policy
//! - Sanitized error responses for internal failures

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use spendlens_core::{ClassifierBackend, ClassifierClient, StatementAnalyzer};

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Room for multipart framing and small form fields on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Server configuration
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Read settings from the environment (`SPENDLENS_ALLOWED_ORIGINS`, comma-separated)
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("SPENDLENS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { allowed_origins }
    }
}

/// Shared application state
pub struct AppState {
    pub analyzer: StatementAnalyzer<ClassifierClient>,
}

/// Build the application router
pub fn create_router(analyzer: StatementAnalyzer<ClassifierClient>, config: ServerConfig) -> Router {
    let state = Arc::new(AppState { analyzer });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/upload", post(handlers::upload_statement));

    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .nest("/api", api_routes)
        // Unprefixed upload route kept for existing clients
        .route("/upload", post(handlers::upload_statement))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + MULTIPART_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(
    analyzer: StatementAnalyzer<ClassifierClient>,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_classifier_connection(analyzer.classifier()).await;

    let app = create_router(analyzer, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log classifier connection status
async fn check_classifier_connection(client: &ClassifierClient) {
    if client.health_check().await {
        info!(
            "Classifier connected: {} ({}, model {})",
            client.host(),
            client.backend_name(),
            client.model()
        );
    } else {
        warn!(
            "Classifier configured but not responding: {} (model {}); transactions will be Uncategorized",
            client.host(),
            client.model()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(kind: &'static str, msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn payload_too_large(msg: &str) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            kind: "payload_too_large",
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, kind = self.kind, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message,
            "kind": self.kind,
        }));

        (self.status, body).into_response()
    }
}

impl From<spendlens_core::Error> for AppError {
    fn from(err: spendlens_core::Error) -> Self {
        if err.is_input_error() {
            Self {
                status: StatusCode::BAD_REQUEST,
                kind: err.kind(),
                message: err.to_string(),
                internal: None,
            }
        } else {
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                kind: err.kind(),
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(err.into()),
            }
        }
    }
}
