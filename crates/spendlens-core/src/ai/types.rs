//! Classifier response types
//!
//! These types are backend-agnostic and used across all classifier implementations.

use serde::{Deserialize, Serialize};

/// Background text retrieved for a description before prediction
///
/// Opaque to the pipeline: it is only handed back to the same backend's
/// `predict` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedContext(pub String);

impl RetrievedContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Raw category prediction from a classifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted category; `None` or blank when the model had no answer
    #[serde(default)]
    pub category: Option<String>,
}

impl Prediction {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }

    pub fn none() -> Self {
        Self { category: None }
    }

    /// The predicted label, if it is non-blank
    pub fn label(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_label_ignores_blank() {
        assert_eq!(Prediction::category("groceries").label(), Some("groceries"));
        assert_eq!(Prediction::category("  rent ").label(), Some("rent"));
        assert_eq!(Prediction::category("   ").label(), None);
        assert_eq!(Prediction::none().label(), None);
    }
}
