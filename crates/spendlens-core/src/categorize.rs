//! Transaction categorization
//!
//! Runs each distinct description through the classifier (context retrieval,
//! then prediction), applies the fallback label and the override mapping, and
//! records per-transaction failures instead of failing the whole statement.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::ai::ClassifierBackend;
use crate::error::{Error, Result};
use crate::models::{
    CategorizedTransaction, CategoryMapping, ClassificationFailure, TransactionRecord,
    UNCATEGORIZED,
};

/// Limits applied to classifier calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierSettings {
    /// Bound on one attempt (context retrieval + prediction)
    pub timeout: Duration,
    /// Extra attempts after a transient failure
    pub max_retries: u32,
    /// Classifications in flight at once
    pub concurrency: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_retries: 1,
            concurrency: 4,
        }
    }
}

/// Result of categorizing a statement
#[derive(Debug, Clone, Default)]
pub struct CategorizationOutcome {
    /// One entry per input record, in input order
    pub transactions: Vec<CategorizedTransaction>,
    /// Transactions that fell back to the default label because the classifier failed
    pub failures: Vec<ClassificationFailure>,
}

/// Assigns categories to transactions using a classifier backend
pub struct Categorizer<B> {
    classifier: B,
    settings: ClassifierSettings,
}

impl<B: ClassifierBackend> Categorizer<B> {
    pub fn new(classifier: B, settings: ClassifierSettings) -> Self {
        Self {
            classifier,
            settings,
        }
    }

    pub fn classifier(&self) -> &B {
        &self.classifier
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Categorize a single description
    ///
    /// Unlike [`categorize`](Self::categorize), a classifier failure is
    /// returned as an error rather than replaced by the fallback label.
    pub async fn categorize_description(
        &self,
        description: &str,
        mapping: Option<&CategoryMapping>,
    ) -> Result<String> {
        let raw = self.classify(description).await?;
        Ok(apply_mapping(raw, mapping))
    }

    /// Categorize every record, preserving order
    pub async fn categorize(
        &self,
        records: Vec<TransactionRecord>,
        mapping: Option<&CategoryMapping>,
    ) -> CategorizationOutcome {
        // Identical descriptions are classified once per statement
        let mut distinct: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for record in &records {
            if seen.insert(record.description.as_str()) {
                distinct.push(record.description.as_str());
            }
        }

        debug!(
            transactions = records.len(),
            distinct = distinct.len(),
            concurrency = self.settings.concurrency,
            "Classifying descriptions"
        );

        let results: HashMap<String, std::result::Result<String, String>> =
            stream::iter(distinct.into_iter().map(str::to_string))
                .map(|description: String| async move {
                    let result = self
                        .classify(&description)
                        .await
                        .map_err(|e| e.to_string());
                    (description, result)
                })
                .buffered(self.settings.concurrency.max(1))
                .collect::<Vec<_>>()
                .await
                .into_iter()
                .collect();

        let mut outcome = CategorizationOutcome::default();
        for (index, record) in records.into_iter().enumerate() {
            let raw = match results.get(&record.description) {
                Some(Ok(label)) => label.clone(),
                Some(Err(reason)) => {
                    outcome.failures.push(ClassificationFailure {
                        index,
                        description: record.description.clone(),
                        reason: reason.clone(),
                    });
                    UNCATEGORIZED.to_string()
                }
                None => UNCATEGORIZED.to_string(),
            };

            let category = apply_mapping(raw, mapping);
            outcome
                .transactions
                .push(CategorizedTransaction { record, category });
        }

        if !outcome.failures.is_empty() {
            warn!(
                failed = outcome.failures.len(),
                "Some transactions could not be classified"
            );
        }
        outcome
    }

    /// Raw label for a description, retrying transient failures
    async fn classify(&self, description: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.attempt(description).await {
                Ok(label) => {
                    let label = label.unwrap_or_else(|| UNCATEGORIZED.to_string());
                    debug!(description, category = %label, "Classified");
                    return Ok(label);
                }
                Err(e) if e.is_transient() && attempt < self.settings.max_retries => {
                    attempt += 1;
                    debug!(description, attempt, error = %e, "Retrying classification");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, description: &str) -> Result<Option<String>> {
        let call = async {
            let context = self.classifier.retrieve_context(description).await?;
            let prediction = self.classifier.predict(description, &context).await?;
            Ok::<_, Error>(prediction.label().map(str::to_string))
        };

        tokio::time::timeout(self.settings.timeout, call)
            .await
            .map_err(|_| Error::Timeout(self.settings.timeout))?
    }
}

fn apply_mapping(raw: String, mapping: Option<&CategoryMapping>) -> String {
    match mapping.and_then(|m| m.get(&raw)) {
        Some(mapped) => mapped.to_string(),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::ai::{MockBackend, Prediction, RetrievedContext};

    fn record(description: &str, amount: &str) -> TransactionRecord {
        TransactionRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: description.to_string(),
            amount: Decimal::from_str(amount).unwrap(),
        }
    }

    fn categorizer<B: ClassifierBackend>(backend: B) -> Categorizer<B> {
        Categorizer::new(backend, ClassifierSettings::default())
    }

    /// Always predicts the same label and counts predict calls
    #[derive(Clone, Default)]
    struct FixedBackend {
        label: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ClassifierBackend for FixedBackend {
        async fn retrieve_context(&self, _description: &str) -> Result<RetrievedContext> {
            Ok(RetrievedContext::default())
        }

        async fn predict(&self, _: &str, _: &RetrievedContext) -> Result<Prediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Prediction {
                category: self.label.map(str::to_string),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn model(&self) -> &str {
            "fixed"
        }

        fn host(&self) -> &str {
            "fixed"
        }
    }

    /// Fails with a transient error `failures` times, then succeeds
    #[derive(Clone)]
    struct FlakyBackend {
        failures: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ClassifierBackend for FlakyBackend {
        async fn retrieve_context(&self, _description: &str) -> Result<RetrievedContext> {
            Ok(RetrievedContext::default())
        }

        async fn predict(&self, _: &str, _: &RetrievedContext) -> Result<Prediction> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(Error::Timeout(Duration::from_millis(1)))
            } else {
                Ok(Prediction::category("groceries"))
            }
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn model(&self) -> &str {
            "flaky"
        }

        fn host(&self) -> &str {
            "flaky"
        }
    }

    /// Never answers within any reasonable timeout
    struct SlowBackend;

    #[async_trait]
    impl ClassifierBackend for SlowBackend {
        async fn retrieve_context(&self, _description: &str) -> Result<RetrievedContext> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(RetrievedContext::default())
        }

        async fn predict(&self, _: &str, _: &RetrievedContext) -> Result<Prediction> {
            Ok(Prediction::none())
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn model(&self) -> &str {
            "slow"
        }

        fn host(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_mapping_applied_to_prediction() {
        let categorizer = categorizer(FixedBackend {
            label: Some("groceries"),
            ..Default::default()
        });
        let mapping = CategoryMapping::parse("groceries:Food & Dining").unwrap();

        assert_eq!(
            categorizer
                .categorize_description("Grocery Store", Some(&mapping))
                .await
                .unwrap(),
            "Food & Dining"
        );
        assert_eq!(
            categorizer
                .categorize_description("Grocery Store", None)
                .await
                .unwrap(),
            "groceries"
        );
    }

    #[tokio::test]
    async fn test_missing_or_blank_prediction_is_uncategorized() {
        let none = categorizer(FixedBackend::default());
        assert_eq!(
            none.categorize_description("XYZ", None).await.unwrap(),
            UNCATEGORIZED
        );

        let blank = categorizer(FixedBackend {
            label: Some("  "),
            ..Default::default()
        });
        assert_eq!(
            blank.categorize_description("XYZ", None).await.unwrap(),
            UNCATEGORIZED
        );
    }

    #[tokio::test]
    async fn test_categorize_preserves_order_and_dedupes_calls() {
        let backend = FixedBackend {
            label: Some("groceries"),
            ..Default::default()
        };
        let calls = backend.calls.clone();
        let categorizer = categorizer(backend);

        let records = vec![
            record("Grocery Store", "-10.00"),
            record("Corner Market", "-5.00"),
            record("Grocery Store", "-20.00"),
        ];
        let outcome = categorizer.categorize(records, None).await;

        assert!(outcome.failures.is_empty());
        let amounts: Vec<String> = outcome
            .transactions
            .iter()
            .map(|t| t.record.amount.to_string())
            .collect();
        assert_eq!(amounts, vec!["-10.00", "-5.00", "-20.00"]);
        assert!(outcome.transactions.iter().all(|t| t.category == "groceries"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_categorize_records_failures_per_transaction() {
        let categorizer = categorizer(MockBackend::new().failing_on(["Grocery Store"]));
        let mapping = CategoryMapping::parse("groceries:Food & Dining").unwrap();

        let records = vec![
            record("Grocery Store", "-10.00"),
            record("Whole Foods", "-30.00"),
            record("Grocery Store", "-20.00"),
        ];
        let outcome = categorizer.categorize(records, Some(&mapping)).await;

        let categories: Vec<&str> = outcome
            .transactions
            .iter()
            .map(|t| t.category.as_str())
            .collect();
        assert_eq!(categories, vec![UNCATEGORIZED, "Food & Dining", UNCATEGORIZED]);

        let indexes: Vec<usize> = outcome.failures.iter().map(|f| f.index).collect();
        assert_eq!(indexes, vec![0, 2]);
        assert_eq!(outcome.failures[0].description, "Grocery Store");
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let backend = FlakyBackend {
            failures: 1,
            calls: Arc::default(),
        };
        let calls = backend.calls.clone();
        let categorizer = categorizer(backend);

        assert_eq!(
            categorizer.categorize_description("WHOLEFDS", None).await.unwrap(),
            "groceries"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let backend = FlakyBackend {
            failures: 10,
            calls: Arc::default(),
        };
        let calls = backend.calls.clone();
        let categorizer = Categorizer::new(
            backend,
            ClassifierSettings {
                max_retries: 2,
                ..Default::default()
            },
        );

        let err = categorizer
            .categorize_description("WHOLEFDS", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_failure_is_not_retried() {
        let categorizer = categorizer(MockBackend::new().failing_on(["Rent"]));
        let err = categorizer
            .categorize_description("Rent", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Classifier(_)));
    }

    #[tokio::test]
    async fn test_slow_classifier_times_out() {
        let categorizer = Categorizer::new(
            SlowBackend,
            ClassifierSettings {
                timeout: Duration::from_millis(20),
                max_retries: 0,
                concurrency: 1,
            },
        );

        let outcome = categorizer
            .categorize(vec![record("Grocery Store", "-10.00")], None)
            .await;
        assert_eq!(outcome.transactions[0].category, UNCATEGORIZED);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let categorizer = categorizer(MockBackend::new());
        let outcome = categorizer.categorize(Vec::new(), None).await;
        assert!(outcome.transactions.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
