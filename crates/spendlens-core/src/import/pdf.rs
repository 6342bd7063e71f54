//! PDF statement parser
//!
//! Text is pulled out of the PDF with `pdf-extract` and split into lines.
//! Page boundaries are best-effort: text is split on form feeds when the
//! extractor emits them, but pdf-extract 0.10 joins pages with plain newlines,
//! so a whole document usually arrives as a single block. Line order is
//! document order either way. Each line is offered to a [`LineParser`]; the
//! default [`DatedLinePattern`] accepts lines of the form
//!
//! ```text
//! 15-Jan-2024 Coffee Shop Purchase -4.50
//! ```
//!
//! Lines that do not match are counted as skipped rather than dropped silently,
//! so callers can tell when a statement layout (wrapped descriptions, amounts
//! on their own line) is not being understood.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::ParsedStatement;
use crate::error::{Error, Result};
use crate::models::TransactionRecord;

/// Page separator, when the extractor emits one
const PAGE_BREAK: char = '\u{000C}';

/// Strategy for turning statement text into transactions
///
/// Implementations decide which lines are transactions. Swap in a different
/// parser for layouts the default pattern cannot read.
pub trait LineParser: Send + Sync {
    /// Parse one block of text (a page, or the whole document)
    fn parse_text(&self, text: &str) -> ParsedStatement;
}

/// `<DD-Mon-YYYY> <description> <amount>` on a single line
#[derive(Debug, Clone, Copy, Default)]
pub struct DatedLinePattern;

fn transaction_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2}-[A-Za-z]{3}-\d{4})\s+(.+?)\s+(-?\d+\.\d{2})$")
            .expect("transaction line regex")
    })
}

impl DatedLinePattern {
    /// Parse a single line; `None` when it is not a transaction
    pub fn parse_line(&self, line: &str) -> Option<TransactionRecord> {
        let caps = transaction_line_re().captures(line.trim())?;

        let date = NaiveDate::parse_from_str(&caps[1], "%d-%b-%Y").ok()?;
        let description = caps[2].trim().to_string();
        let amount = Decimal::from_str(&caps[3]).ok()?;

        Some(TransactionRecord {
            date,
            description,
            amount,
        })
    }
}

impl LineParser for DatedLinePattern {
    fn parse_text(&self, text: &str) -> ParsedStatement {
        let mut parsed = ParsedStatement::default();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(line) {
                Some(record) => parsed.transactions.push(record),
                None => parsed.skipped_lines += 1,
            }
        }

        parsed
    }
}

/// Extract document text, split into pages where form feeds mark them
pub fn extract_pages(data: &[u8]) -> Result<Vec<String>> {
    // pdf-extract panics on some malformed documents
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
        .map_err(|_| Error::Pdf("text extraction aborted on malformed document".into()))?
        .map_err(|e| Error::Pdf(e.to_string()))?;

    let pages: Vec<String> = text.split(PAGE_BREAK).map(|s| s.to_string()).collect();
    debug!("Extracted {} bytes of text across {} pages", text.len(), pages.len());
    Ok(pages)
}

/// Run a line parser over every page, keeping page then line order
pub fn parse_pages(pages: &[String], parser: &dyn LineParser) -> ParsedStatement {
    let mut parsed = ParsedStatement::default();
    for page in pages {
        parsed.extend(parser.parse_text(page));
    }

    if parsed.skipped_lines > 0 {
        warn!(
            skipped = parsed.skipped_lines,
            "Some statement lines did not match the transaction pattern"
        );
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_line_full_match() {
        let record = DatedLinePattern
            .parse_line("15-Jan-2024 Coffee Shop Purchase -4.50")
            .unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(record.description, "Coffee Shop Purchase");
        assert_eq!(record.amount, dec("-4.50"));
        assert_eq!(record.amount.scale(), 2);
    }

    #[test]
    fn test_parse_line_positive_amount() {
        let record = DatedLinePattern
            .parse_line("01-Feb-2024 Salary ACME Corp 2500.00")
            .unwrap();
        assert_eq!(record.description, "Salary ACME Corp");
        assert_eq!(record.amount, dec("2500.00"));
    }

    #[test]
    fn test_parse_line_requires_two_decimal_amount() {
        assert!(DatedLinePattern
            .parse_line("15-Jan-2024 Coffee Shop Purchase")
            .is_none());
        assert!(DatedLinePattern
            .parse_line("15-Jan-2024 Coffee Shop Purchase -4.5")
            .is_none());
        assert!(DatedLinePattern
            .parse_line("15-Jan-2024 Coffee Shop Purchase -4.50 USD")
            .is_none());
    }

    #[test]
    fn test_parse_line_rejects_other_layouts() {
        assert!(DatedLinePattern.parse_line("Opening balance 100.00").is_none());
        assert!(DatedLinePattern
            .parse_line("2024-01-15 Coffee Shop -4.50")
            .is_none());
        // Looks right but is not a calendar date
        assert!(DatedLinePattern
            .parse_line("31-Feb-2024 Coffee Shop -4.50")
            .is_none());
    }

    #[test]
    fn test_parse_text_counts_skipped_lines() {
        let page = "Statement for January\n\n15-Jan-2024 Coffee -4.50\nPage 1 of 2\n16-Jan-2024 Rent -1200.00\n";
        let parsed = DatedLinePattern.parse_text(page);
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.skipped_lines, 2);
    }

    #[test]
    fn test_parse_pages_keeps_encounter_order() {
        let pages = vec![
            "20-Jan-2024 Late entry -1.00\n10-Jan-2024 Early entry -2.00".to_string(),
            "05-Jan-2024 Second page -3.00".to_string(),
        ];
        let parsed = parse_pages(&pages, &DatedLinePattern);
        let descriptions: Vec<&str> = parsed
            .transactions
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["Late entry", "Early entry", "Second page"]);
        assert_eq!(parsed.skipped_lines, 0);
    }

    #[test]
    fn test_pages_joined_without_form_feed() {
        // How pdf-extract 0.10 hands back a two-page document
        let text = "Statement for January\n15-Jan-2024 Coffee -4.50\n\nPage 2 of 2\n01-Feb-2024 Rent 1200.00\n";
        let pages: Vec<String> = text.split(PAGE_BREAK).map(|s| s.to_string()).collect();
        assert_eq!(pages.len(), 1);

        let parsed = parse_pages(&pages, &DatedLinePattern);
        let descriptions: Vec<&str> = parsed
            .transactions
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["Coffee", "Rent"]);
        assert_eq!(parsed.skipped_lines, 2);
    }

    #[test]
    fn test_custom_line_parser() {
        /// Accepts nothing; every non-blank line is skipped
        struct RejectAll;

        impl LineParser for RejectAll {
            fn parse_text(&self, text: &str) -> ParsedStatement {
                ParsedStatement {
                    transactions: vec![],
                    skipped_lines: text.lines().filter(|l| !l.trim().is_empty()).count(),
                }
            }
        }

        let pages = vec!["15-Jan-2024 Coffee -4.50".to_string()];
        let parsed = parse_pages(&pages, &RejectAll);
        assert!(parsed.is_empty());
        assert_eq!(parsed.skipped_lines, 1);
    }
}
