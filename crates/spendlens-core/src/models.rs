//! Domain models for SpendLens

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Category assigned when the classifier has no answer
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Supported statement file types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementFormat {
    Csv,
    Pdf,
}

impl StatementFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    /// Resolve the format from a file name's extension
    pub fn from_filename(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(format!("no file extension in {:?}", name)))?;
        ext.parse()
    }
}

impl std::str::FromStr for StatementFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" | "text/csv" => Ok(Self::Csv),
            "pdf" | "application/pdf" => Ok(Self::Pdf),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for StatementFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single transaction extracted from a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub description: String,
    /// Signed amount, exactly as written in the statement
    pub amount: Decimal,
}

/// A transaction with its final category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub category: String,
}

/// Override mapping from a predicted category to the category reported to the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMapping(HashMap<String, String>);

impl CategoryMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `k1:v1,k2:v2` override string
    ///
    /// Surrounding whitespace is trimmed from keys and values. Every entry must
    /// contain exactly one `:` and a non-empty key. A blank string is an empty
    /// mapping. Later duplicates replace earlier ones.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut map = HashMap::new();
        if raw.trim().is_empty() {
            return Ok(Self(map));
        }

        for entry in raw.split(',') {
            let parts: Vec<&str> = entry.split(':').collect();
            if parts.len() != 2 {
                return Err(Error::InvalidCategoryMapping(format!(
                    "expected key:value, got {:?}",
                    entry
                )));
            }
            let key = parts[0].trim();
            if key.is_empty() {
                return Err(Error::InvalidCategoryMapping(format!(
                    "empty category name in {:?}",
                    entry
                )));
            }
            map.insert(key.to_string(), parts[1].trim().to_string());
        }

        Ok(Self(map))
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.0.insert(from.into(), to.into());
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.0.get(category).map(String::as_str)
    }

    /// Final category for a prediction; unmapped categories pass through
    pub fn resolve<'a>(&'a self, category: &'a str) -> &'a str {
        self.get(category).unwrap_or(category)
    }

    /// New mapping with `other`'s entries taking precedence
    pub fn overlay(&self, other: &CategoryMapping) -> CategoryMapping {
        let mut merged = self.0.clone();
        merged.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        CategoryMapping(merged)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries sorted by key (for display)
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort();
        entries
    }
}

impl FromIterator<(String, String)> for CategoryMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Spending limit per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable(BTreeMap<String, Decimal>);

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a limit; negative limits are rejected
    pub fn insert(&mut self, category: impl Into<String>, limit: Decimal) -> Result<()> {
        let category = category.into();
        if limit < Decimal::ZERO {
            return Err(Error::Config(format!(
                "threshold for {:?} must not be negative (got {})",
                category, limit
            )));
        }
        self.0.insert(category, limit);
        Ok(())
    }

    pub fn limit_for(&self, category: &str) -> Option<Decimal> {
        self.0.get(category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Total signed amount per category for one statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpendingSummary(BTreeMap<String, Decimal>);

impl SpendingSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: &str, amount: Decimal) {
        *self.0.entry(category.to_string()).or_insert(Decimal::ZERO) += amount;
    }

    pub fn total_for(&self, category: &str) -> Option<Decimal> {
        self.0.get(category).copied()
    }

    /// Categories in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_totals(&self) -> Vec<CategoryTotal> {
        self.iter()
            .map(|(category, amount)| CategoryTotal {
                category: category.to_string(),
                amount,
            })
            .collect()
    }
}

/// One row of the reported spending summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

/// A category whose spend went over its limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Alert: Overspending in {}. Limit: ${:.2}, Spent: ${:.2}",
            self.category, self.limit, self.spent
        )
    }
}

/// A classifier call that failed for one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationFailure {
    /// Position of the transaction in statement order
    pub index: usize,
    pub description: String,
    pub reason: String,
}

/// Counters describing how the statement was processed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub transactions: usize,
    pub skipped_lines: usize,
    pub classifier_failures: usize,
}

/// Result of analyzing one statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub spending_summary: Vec<CategoryTotal>,
    pub alerts: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub stats: AnalysisStats,
}
