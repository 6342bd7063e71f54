//! Pluggable transaction classifier
//!
//! The categorizer asks a classifier two things about each description:
//! background context (`retrieve_context`) and then a category prediction
//! given that context (`predict`). Everything else about the model is hidden
//! behind [`ClassifierBackend`].
//!
//! # Architecture
//!
//! - `ClassifierBackend` trait: the interface every backend implements
//! - `ClassifierClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `CLASSIFIER_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

mod mock;
mod ollama;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all classifier backends
///
/// Backends must be Send + Sync so the categorizer can run several
/// classifications concurrently.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// Fetch background context for a transaction description
    async fn retrieve_context(&self, description: &str) -> Result<RetrievedContext>;

    /// Predict a category for a description, given its retrieved context
    async fn predict(&self, description: &str, context: &RetrievedContext) -> Result<Prediction>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete classifier client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ClassifierClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing and offline use
    Mock(MockBackend),
}

impl ClassifierClient {
    /// Create a classifier client from environment variables
    ///
    /// Checks `CLASSIFIER_BACKEND` to determine which backend to use:
    /// - `ollama` (default): Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `mock`: Keyword-based classifier, no network
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("CLASSIFIER_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(ClassifierClient::Ollama),
            "mock" => Some(ClassifierClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown CLASSIFIER_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(ClassifierClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        ClassifierClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend
    pub fn mock() -> Self {
        ClassifierClient::Mock(MockBackend::new())
    }

    /// Short backend name for display
    pub fn backend_name(&self) -> &'static str {
        match self {
            ClassifierClient::Ollama(_) => "ollama",
            ClassifierClient::Mock(_) => "mock",
        }
    }
}

#[async_trait]
impl ClassifierBackend for ClassifierClient {
    async fn retrieve_context(&self, description: &str) -> Result<RetrievedContext> {
        match self {
            ClassifierClient::Ollama(b) => b.retrieve_context(description).await,
            ClassifierClient::Mock(b) => b.retrieve_context(description).await,
        }
    }

    async fn predict(&self, description: &str, context: &RetrievedContext) -> Result<Prediction> {
        match self {
            ClassifierClient::Ollama(b) => b.predict(description, context).await,
            ClassifierClient::Mock(b) => b.predict(description, context).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ClassifierClient::Ollama(b) => b.health_check().await,
            ClassifierClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ClassifierClient::Ollama(b) => b.model(),
            ClassifierClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            ClassifierClient::Ollama(b) => b.host(),
            ClassifierClient::Mock(b) => b.host(),
        }
    }
}
