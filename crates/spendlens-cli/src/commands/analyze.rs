//! Statement analysis command

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use spendlens_core::{AnalysisReport, AnalyzerConfig, ClassifierClient, StatementAnalyzer};

pub async fn cmd_analyze(
    config: AnalyzerConfig,
    classifier: ClassifierClient,
    file: &Path,
    format: Option<&str>,
    categories: Option<&str>,
    json: bool,
) -> Result<()> {
    let analyzer = StatementAnalyzer::new(Arc::new(config), classifier);

    let report = analyzer
        .analyze_file(file, format, categories)
        .await
        .with_context(|| format!("Failed to analyze {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(file, &report));
    }

    Ok(())
}

/// Human-readable report
pub fn render_report(file: &Path, report: &AnalysisReport) -> String {
    ReportView { file, report }.to_string()
}

struct ReportView<'a> {
    file: &'a Path,
    report: &'a AnalysisReport,
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        writeln!(f, "📄 {}", self.file.display())?;
        writeln!(
            f,
            "   {} transactions, {} categories",
            report.stats.transactions,
            report.spending_summary.len()
        )?;
        writeln!(f)?;

        if report.spending_summary.is_empty() {
            writeln!(f, "No spending to summarize.")?;
        } else {
            let width = report
                .spending_summary
                .iter()
                .map(|t| t.category.chars().count())
                .max()
                .unwrap_or(0)
                .max("Category".len());

            writeln!(f, "{:<width$}  {:>12}", "Category", "Amount")?;
            writeln!(f, "{}", "-".repeat(width + 14))?;
            for total in &report.spending_summary {
                writeln!(
                    f,
                    "{:<width$}  {:>12}",
                    total.category,
                    format!("{:.2}", total.amount)
                )?;
            }
        }

        if !report.alerts.is_empty() {
            writeln!(f)?;
            for alert in &report.alerts {
                writeln!(f, "🚨 {}", alert)?;
            }
        }

        if !report.warnings.is_empty() {
            writeln!(f)?;
            for warning in &report.warnings {
                writeln!(f, "⚠️  {}", warning)?;
            }
        }

        Ok(())
    }
}
