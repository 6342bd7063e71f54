//! Statement analysis pipeline
//!
//! parse → categorize → summarize → alert, for one uploaded statement.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::ClassifierBackend;
use crate::alerts::evaluate_alerts;
use crate::categorize::Categorizer;
use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::import::{parse_statement_with, DatedLinePattern, LineParser};
use crate::models::{AnalysisReport, AnalysisStats, CategoryMapping, StatementFormat, UNCATEGORIZED};
use crate::summary::summarize;

/// Pick the statement format from a declared type, falling back to the file name
///
/// `declared` may be a short name (`csv`, `pdf`) or a MIME type.
pub fn resolve_format(declared: Option<&str>, filename: Option<&str>) -> Result<StatementFormat> {
    match (declared.map(str::trim).filter(|d| !d.is_empty()), filename) {
        (Some(declared), _) => declared.parse(),
        (None, Some(name)) => StatementFormat::from_filename(name),
        (None, None) => Err(Error::UnsupportedFormat(
            "no declared type or file name".into(),
        )),
    }
}

/// Runs the full analysis for one statement at a time
///
/// Holds no per-request state; one analyzer can serve concurrent requests.
pub struct StatementAnalyzer<B> {
    config: Arc<AnalyzerConfig>,
    categorizer: Categorizer<B>,
    line_parser: Box<dyn LineParser>,
}

impl<B: ClassifierBackend> StatementAnalyzer<B> {
    pub fn new(config: Arc<AnalyzerConfig>, classifier: B) -> Self {
        let categorizer = Categorizer::new(classifier, config.classifier.clone());
        Self {
            config,
            categorizer,
            line_parser: Box::new(DatedLinePattern),
        }
    }

    /// Use a different PDF line parser
    pub fn with_line_parser(mut self, parser: impl LineParser + 'static) -> Self {
        self.line_parser = Box::new(parser);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn classifier(&self) -> &B {
        self.categorizer.classifier()
    }

    /// Analyze statement bytes
    ///
    /// `custom_categories` is a `from:to,from:to` override string; its
    /// entries take precedence over the configured default mapping.
    pub async fn analyze(
        &self,
        bytes: &[u8],
        format: StatementFormat,
        custom_categories: Option<&str>,
    ) -> Result<AnalysisReport> {
        // Reject a bad mapping before doing any work
        let request_mapping = CategoryMapping::parse(custom_categories.unwrap_or(""))?;
        let mapping = self.config.categories.overlay(&request_mapping);

        let parsed = parse_statement_with(bytes, format, self.line_parser.as_ref())?;
        let skipped_lines = parsed.skipped_lines;
        let mut report = AnalysisReport::default();

        if skipped_lines > 0 {
            report.warnings.push(format!(
                "{} statement line(s) did not match the transaction format and were skipped",
                skipped_lines
            ));
        }

        if parsed.is_empty() {
            warn!(format = %format, "Statement contained no transactions");
            report.warnings.push("No transactions found in statement".to_string());
            report.stats = AnalysisStats {
                transactions: 0,
                skipped_lines,
                classifier_failures: 0,
            };
            return Ok(report);
        }

        let transaction_count = parsed.transactions.len();
        let outcome = self
            .categorizer
            .categorize(parsed.transactions, Some(&mapping))
            .await;

        for failure in &outcome.failures {
            report.warnings.push(format!(
                "Could not classify transaction {} ('{}'), counted as {}: {}",
                failure.index + 1,
                failure.description,
                UNCATEGORIZED,
                failure.reason
            ));
        }

        let summary = summarize(&outcome.transactions);
        let alerts = evaluate_alerts(&summary, &self.config.thresholds, &self.config.alerts);

        report.spending_summary = summary.to_totals();
        report.alerts = alerts.iter().map(ToString::to_string).collect();
        report.stats = AnalysisStats {
            transactions: transaction_count,
            skipped_lines,
            classifier_failures: outcome.failures.len(),
        };

        info!(
            format = %format,
            transactions = transaction_count,
            categories = report.spending_summary.len(),
            alerts = report.alerts.len(),
            failures = report.stats.classifier_failures,
            "Analyzed statement"
        );
        Ok(report)
    }

    /// Read and analyze a statement file
    pub async fn analyze_file(
        &self,
        path: &Path,
        declared: Option<&str>,
        custom_categories: Option<&str>,
    ) -> Result<AnalysisReport> {
        let filename = path.file_name().and_then(|n| n.to_str());
        let format = resolve_format(declared, filename)?;
        let bytes = tokio::fs::read(path).await?;
        self.analyze(&bytes, format, custom_categories).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn analyzer() -> StatementAnalyzer<MockBackend> {
        let config = AnalyzerConfig::embedded().unwrap();
        StatementAnalyzer::new(Arc::new(config), MockBackend::new())
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(
            resolve_format(Some("application/pdf"), Some("x.csv")).unwrap(),
            StatementFormat::Pdf
        );
        assert_eq!(
            resolve_format(None, Some("statement.CSV")).unwrap(),
            StatementFormat::Csv
        );
        assert_eq!(
            resolve_format(Some(" "), Some("statement.pdf")).unwrap(),
            StatementFormat::Pdf
        );
        assert!(matches!(
            resolve_format(None, Some("statement.docx")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            resolve_format(None, None),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_mapping_fails_before_parsing() {
        // The statement is also invalid; the mapping error must win
        let err = analyzer()
            .analyze(b"not,a,statement", StatementFormat::Csv, Some("groceries"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCategoryMapping(_)));
    }

    #[tokio::test]
    async fn test_empty_statement_is_not_an_error() {
        let report = analyzer()
            .analyze(b"Date,Description,Amount\n", StatementFormat::Csv, None)
            .await
            .unwrap();
        assert!(report.spending_summary.is_empty());
        assert!(report.alerts.is_empty());
        assert_eq!(report.warnings, vec!["No transactions found in statement"]);
    }

    #[tokio::test]
    async fn test_analyze_applies_default_mapping() {
        let csv = "Date,Description,Amount\n2024-01-15,Grocery Store,300.00\n2024-01-16,Whole Foods,250.50\n";
        let report = analyzer()
            .analyze(csv.as_bytes(), StatementFormat::Csv, None)
            .await
            .unwrap();

        assert_eq!(report.spending_summary.len(), 1);
        assert_eq!(report.spending_summary[0].category, "Food & Dining");
        assert_eq!(
            report.alerts,
            vec!["Alert: Overspending in Food & Dining. Limit: $500.00, Spent: $550.50"]
        );
        assert_eq!(report.stats.transactions, 2);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_request_mapping_overrides_default() {
        let csv = "Date,Description,Amount\n2024-01-15,Grocery Store,10.00\n";
        let report = analyzer()
            .analyze(csv.as_bytes(), StatementFormat::Csv, Some("groceries:Supermarket"))
            .await
            .unwrap();
        assert_eq!(report.spending_summary[0].category, "Supermarket");
    }

    #[tokio::test]
    async fn test_classifier_failures_become_warnings() {
        let config = AnalyzerConfig::embedded().unwrap();
        let analyzer = StatementAnalyzer::new(
            Arc::new(config),
            MockBackend::new().failing_on(["Mystery Charge"]),
        );
        let csv = "Date,Description,Amount\n2024-01-15,Mystery Charge,12.00\n2024-01-16,March Rent,1300.00\n";
        let report = analyzer
            .analyze(csv.as_bytes(), StatementFormat::Csv, None)
            .await
            .unwrap();

        assert_eq!(report.stats.classifier_failures, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Mystery Charge"));
        let categories: Vec<&str> = report
            .spending_summary
            .iter()
            .map(|t| t.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Housing", UNCATEGORIZED]);
        assert_eq!(report.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_file_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.csv");
        std::fs::write(&path, "Date,Description,Amount\n2024-01-15,Coffee,4.50\n").unwrap();

        let report = analyzer().analyze_file(&path, None, None).await.unwrap();
        assert_eq!(report.stats.transactions, 1);

        let txt = dir.path().join("statement.txt");
        std::fs::write(&txt, "hello").unwrap();
        assert!(matches!(
            analyzer().analyze_file(&txt, None, None).await,
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
