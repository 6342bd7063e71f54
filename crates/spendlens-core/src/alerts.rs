//! Threshold alerts
//!
//! A category alerts when its spend is strictly greater than its limit.
//! Categories without a configured limit never alert.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Alert, SpendingSummary, ThresholdTable};

/// How category totals are read as spend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Statement records spending as negative amounts; compare the negated total
    #[serde(default)]
    pub debits_are_negative: bool,
}

/// Compare each category total against its threshold
///
/// Alerts come out in summary order.
pub fn evaluate_alerts(
    summary: &SpendingSummary,
    thresholds: &ThresholdTable,
    settings: &AlertSettings,
) -> Vec<Alert> {
    summary
        .iter()
        .filter_map(|(category, total)| {
            let limit = thresholds.limit_for(category)?;
            let spent = if settings.debits_are_negative {
                -total
            } else {
                total
            };

            if spent > limit {
                debug!(category, %spent, %limit, "Category over threshold");
                Some(Alert {
                    category: category.to_string(),
                    limit,
                    spent,
                })
            } else {
                None
            }
        })
        .collect()
}
