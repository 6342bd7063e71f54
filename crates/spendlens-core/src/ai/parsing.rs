//! JSON parsing helpers for classifier responses
//!
//! Models often wrap the JSON payload in extra text; these helpers pull out the
//! outermost object before deserializing.

use crate::error::{Error, Result};

use super::types::Prediction;

/// Truncate long responses for error messages
fn truncate_raw(raw: &str) -> String {
    if raw.chars().count() > 200 {
        format!("{}...", raw.chars().take(200).collect::<String>())
    } else {
        raw.to_string()
    }
}

/// Slice out the first `{` through the last `}`
fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if start < end {
        Some(&response[start..=end])
    } else {
        None
    }
}

/// Parse a category prediction from a model response
///
/// Accepts `{"category": "groceries"}` (optionally surrounded by prose) and
/// `{"category": null}`.
pub fn parse_prediction(response: &str) -> Result<Prediction> {
    let response = response.trim();

    match extract_json_object(response) {
        Some(json_str) => serde_json::from_str(json_str).map_err(|e| {
            Error::Classifier(format!(
                "Invalid JSON from classifier: {} | Raw: {}",
                e,
                truncate_raw(json_str)
            ))
        }),
        None => Err(Error::Classifier(format!(
            "No JSON found in classifier response | Raw: {}",
            truncate_raw(response)
        ))),
    }
}

/// Clean up a free-text context response
pub fn parse_context(response: &str) -> String {
    response
        .trim()
        .trim_matches('"')
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
