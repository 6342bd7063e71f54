//! Per-category spending totals

use crate::models::{CategorizedTransaction, SpendingSummary};

/// Sum amounts by category
///
/// Exact decimal arithmetic; every category present in the input appears in
/// the summary.
pub fn summarize(transactions: &[CategorizedTransaction]) -> SpendingSummary {
    let mut summary = SpendingSummary::new();
    for tx in transactions {
        summary.add(&tx.category, tx.record.amount);
    }
    summary
}
