//! Mock backend for testing
//!
//! Keyword rules stand in for a model. Useful for unit tests, demos and
//! running the pipeline without a local LLM server.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::{Prediction, RetrievedContext};
use super::ClassifierBackend;

/// Keyword rules: first matching substring (uppercased) wins
const RULES: &[(&[&str], &str)] = &[
    (&["GROCER", "WHOLE FOODS", "WHOLEFDS", "TRADER JOE", "SAFEWAY", "KROGER"], "groceries"),
    (&["RENT", "LANDLORD", "PROPERTY MGMT"], "rent"),
    (&["ELECTRIC", "WATER BILL", "UTILITY", "UTILITIES", "GAS CO", "COMCAST", "INTERNET"], "utilities"),
    (&["RESTAURANT", "CAFE", "COFFEE", "STARBUCKS", "PIZZA", "DINER"], "dining"),
    (&["UBER", "LYFT", "SHELL", "CHEVRON", "EXXON", "TRANSIT"], "transport"),
    (&["AMAZON", "TARGET", "COSTCO"], "shopping"),
    (&["NETFLIX", "SPOTIFY", "CINEMA"], "entertainment"),
    (&["PHARMACY", "CVS", "WALGREENS", "CLINIC"], "health"),
    (&["AIRLINE", "HOTEL", "AIRBNB"], "travel"),
    (&["SALARY", "PAYROLL", "DIRECT DEP"], "income"),
];

/// Mock classifier backend
///
/// Returns predictable predictions from [`RULES`]; descriptions with no
/// matching rule get no prediction. Specific descriptions can be configured
/// to fail, to exercise the categorizer's failure handling.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    failing: Arc<HashSet<String>>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: Arc::default(),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Make prediction fail for the given descriptions
    pub fn failing_on<I, S>(mut self, descriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing = Arc::new(descriptions.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn rule_for(description: &str) -> Option<&'static str> {
        let upper = description.to_uppercase();
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| upper.contains(k)))
            .map(|(_, label)| *label)
    }
}

#[async_trait]
impl ClassifierBackend for MockBackend {
    async fn retrieve_context(&self, description: &str) -> Result<RetrievedContext> {
        Ok(match Self::rule_for(description) {
            Some(label) => RetrievedContext::new(format!("{description} looks like a {label} merchant")),
            None => RetrievedContext::default(),
        })
    }

    async fn predict(&self, description: &str, _context: &RetrievedContext) -> Result<Prediction> {
        if self.failing.contains(description) {
            return Err(Error::Classifier(format!(
                "mock classifier configured to fail for '{description}'"
            )));
        }

        Ok(Self::rule_for(description)
            .map(Prediction::category)
            .unwrap_or_else(Prediction::none))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
