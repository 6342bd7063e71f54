//! Test utilities for spendlens-core
//!
//! A mock Ollama server for integration tests and local development without
//! a model. It answers the two prompts the Ollama classifier sends using the
//! same keyword rules as [`MockBackend`](crate::ai::MockBackend).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::ai::MockBackend;

#[derive(Default)]
struct ServerState {
    generate_calls: AtomicUsize,
    /// Reply to every generate call with this status instead of a body
    fail_with: Option<StatusCode>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(ServerState::default()).await
    }

    /// Start a server whose generate endpoint always answers `status`
    pub async fn start_failing(status: StatusCode) -> Self {
        Self::start_with(ServerState {
            fail_with: Some(status),
            ..Default::default()
        })
        .await
    }

    async fn start_with(state: ServerState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock Ollama listener");
        let addr = listener.local_addr().expect("mock Ollama address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of generate requests served so far
    pub fn generate_calls(&self) -> usize {
        self.state.generate_calls.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    state.generate_calls.fetch_add(1, Ordering::SeqCst);

    if let Some(status) = state.fail_with {
        return (status, "mock failure").into_response();
    }

    let response = if request.prompt.starts_with("Categorize this bank statement line") {
        let line = quoted_after(&request.prompt, "Line: \"").unwrap_or_default();
        match MockBackend::rule_for(line) {
            Some(label) => format!("{{\"category\": \"{label}\"}}"),
            None => "{\"category\": null}".to_string(),
        }
    } else {
        let line = quoted_after(&request.prompt, "\n\"").unwrap_or_default();
        format!("\"{line}\" is a card payment to a merchant.")
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
    .into_response()
}

/// Text between `marker` and the next double quote
fn quoted_after<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    let start = prompt.find(marker)? + marker.len();
    let rest = &prompt[start..];
    rest.find('"').map(|end| &rest[..end])
}
