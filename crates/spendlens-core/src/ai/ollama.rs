//! Ollama backend implementation
//!
//! HTTP client for the Ollama generate API. Each classification is two
//! non-streaming calls: one that describes the merchant behind a statement
//! line, and one that picks a category given that description.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::parsing::{parse_context, parse_prediction};
use super::types::{Prediction, RetrievedContext};
use super::ClassifierBackend;

/// Ollama classifier backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    category_hints: Vec<String>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            category_hints: Vec::new(),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Suggest these labels to the model when predicting
    pub fn with_category_hints(mut self, hints: Vec<String>) -> Self {
        self.category_hints = hints;
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    fn context_prompt(description: &str) -> String {
        format!(
            "You help categorize bank statement lines.\n\
             In one or two sentences, describe what kind of merchant or payment this is:\n\
             \"{description}\"\n\
             Reply with the description only."
        )
    }

    fn predict_prompt(&self, description: &str, context: &RetrievedContext) -> String {
        let mut prompt = format!(
            "Categorize this bank statement line.\n\nLine: \"{description}\"\n"
        );
        if !context.is_empty() {
            prompt.push_str(&format!("Background: {}\n", context.as_str()));
        }
        if !self.category_hints.is_empty() {
            prompt.push_str(&format!(
                "Prefer one of these categories: {}\n",
                self.category_hints.join(", ")
            ));
        }
        prompt.push_str(
            "\nRespond with JSON only: {\"category\": \"<lowercase category>\"}. \
             Use {\"category\": null} if you cannot tell.",
        );
        prompt
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama response: {}", ollama_response.response);
        Ok(ollama_response.response)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl ClassifierBackend for OllamaBackend {
    async fn retrieve_context(&self, description: &str) -> Result<RetrievedContext> {
        let response = self.generate(Self::context_prompt(description)).await?;
        Ok(RetrievedContext::new(parse_context(&response)))
    }

    async fn predict(&self, description: &str, context: &RetrievedContext) -> Result<Prediction> {
        let response = self
            .generate(self.predict_prompt(description, context))
            .await?;
        parse_prediction(&response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_prompt_includes_context_and_hints() {
        let backend = OllamaBackend::new("http://localhost:11434", "llama3.2")
            .with_category_hints(vec!["groceries".into(), "rent".into()]);
        let prompt = backend.predict_prompt(
            "WHOLEFDS MKT 123",
            &RetrievedContext::new("A supermarket chain."),
        );
        assert!(prompt.contains("WHOLEFDS MKT 123"));
        assert!(prompt.contains("Background: A supermarket chain."));
        assert!(prompt.contains("groceries, rent"));
        assert!(prompt.contains("\"category\""));
    }

    #[test]
    fn test_predict_prompt_skips_empty_context() {
        let backend = OllamaBackend::new("http://localhost:11434", "llama3.2");
        let prompt = backend.predict_prompt("XYZ", &RetrievedContext::default());
        assert!(!prompt.contains("Background:"));
        assert!(!prompt.contains("Prefer one of"));
    }

    #[test]
    fn test_with_model_keeps_host() {
        let backend = OllamaBackend::new("http://ollama:11434/", "llama3.2").with_model("gemma3");
        assert_eq!(backend.model(), "gemma3");
        assert_eq!(backend.host(), "http://ollama:11434");
    }

    #[tokio::test]
    async fn test_classify_against_mock_server() {
        use crate::test_utils::MockOllamaServer;

        let server = MockOllamaServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        assert!(backend.health_check().await);

        let context = backend.retrieve_context("WHOLEFDS MKT 10234").await.unwrap();
        assert!(context.as_str().contains("WHOLEFDS MKT 10234"));

        let prediction = backend.predict("WHOLEFDS MKT 10234", &context).await.unwrap();
        assert_eq!(prediction.label(), Some("groceries"));

        let unknown = backend
            .predict("ZZZ 0001", &RetrievedContext::default())
            .await
            .unwrap();
        assert_eq!(unknown.label(), None);
        assert_eq!(server.generate_calls(), 3);
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        use crate::test_utils::MockOllamaServer;
        use axum::http::StatusCode;

        let server = MockOllamaServer::start_failing(StatusCode::SERVICE_UNAVAILABLE).await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let err = backend.retrieve_context("Coffee").await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Http(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_client_error_is_not_transient() {
        use crate::test_utils::MockOllamaServer;
        use axum::http::StatusCode;

        let server = MockOllamaServer::start_failing(StatusCode::NOT_FOUND).await;
        let backend = OllamaBackend::new(&server.url(), "missing-model");

        let err = backend.retrieve_context("Coffee").await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        // Port 9 (discard) is not an Ollama server
        let backend = OllamaBackend::new("http://127.0.0.1:9", "llama3.2");
        assert!(!backend.health_check().await);
    }
}
