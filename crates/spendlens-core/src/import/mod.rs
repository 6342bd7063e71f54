//! Statement parsers
//!
//! Turns uploaded statement bytes into an ordered list of transactions:
//! - `tabular`: CSV exports with `Date`, `Description` and `Amount` columns
//! - `pdf`: text statements with one transaction per line
//!
//! Output order is always the order transactions appear in the source file.

pub mod pdf;
pub mod tabular;

pub use pdf::{extract_pages, parse_pages, DatedLinePattern, LineParser};
pub use tabular::parse_csv;

use tracing::debug;

use crate::error::Result;
use crate::models::{StatementFormat, TransactionRecord};

/// Transactions extracted from one statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStatement {
    pub transactions: Vec<TransactionRecord>,
    /// Non-blank lines that did not look like a transaction (PDF only)
    pub skipped_lines: usize,
}

impl ParsedStatement {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append another parse result, keeping encounter order
    pub fn extend(&mut self, other: ParsedStatement) {
        self.transactions.extend(other.transactions);
        self.skipped_lines += other.skipped_lines;
    }
}

/// Parse a statement using the default line parser for PDFs
pub fn parse_statement(bytes: &[u8], format: StatementFormat) -> Result<ParsedStatement> {
    parse_statement_with(bytes, format, &DatedLinePattern)
}

/// Parse a statement with a custom PDF line parser
pub fn parse_statement_with(
    bytes: &[u8],
    format: StatementFormat,
    line_parser: &dyn LineParser,
) -> Result<ParsedStatement> {
    let parsed = match format {
        StatementFormat::Csv => ParsedStatement {
            transactions: parse_csv(bytes)?,
            skipped_lines: 0,
        },
        StatementFormat::Pdf => {
            let pages = extract_pages(bytes)?;
            parse_pages(&pages, line_parser)
        }
    };

    debug!(
        format = %format,
        transactions = parsed.transactions.len(),
        skipped_lines = parsed.skipped_lines,
        "Parsed statement"
    );
    Ok(parsed)
}
