//! CSV statement parser
//!
//! Expected header: at least `Date`, `Description` and `Amount` (exact,
//! case-sensitive names, any column order). Extra columns are ignored.
//!
//! Parsing is fail-fast: one malformed amount or date rejects the whole file
//! so a statement is never silently summarized from a subset of its rows.

use std::str::FromStr;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::TransactionRecord;

const DATE_COLUMN: &str = "Date";
const DESCRIPTION_COLUMN: &str = "Description";
const AMOUNT_COLUMN: &str = "Amount";

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };

        Ok(Self {
            date: find(DATE_COLUMN)?,
            description: find(DESCRIPTION_COLUMN)?,
            amount: find(AMOUNT_COLUMN)?,
        })
    }
}

/// Parse CSV statement data into transactions, in file order
pub fn parse_csv(data: &[u8]) -> Result<Vec<TransactionRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = rdr.headers()?.clone();
    let columns = Columns::from_headers(&headers)?;
    let mut transactions = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        // Line number in the file; the header is line 1
        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 2);

        let date_str = record.get(columns.date).unwrap_or("");
        let date = parse_date(date_str).ok_or_else(|| Error::MalformedDate {
            row,
            value: date_str.to_string(),
        })?;

        let description = record
            .get(columns.description)
            .unwrap_or("")
            .trim()
            .to_string();

        let amount_str = record.get(columns.amount).unwrap_or("");
        let amount = parse_amount(amount_str).ok_or_else(|| Error::MalformedAmount {
            row,
            value: amount_str.to_string(),
        })?;

        transactions.push(TransactionRecord {
            date,
            description,
            amount,
        });
    }

    debug!("Parsed {} CSV transactions", transactions.len());
    Ok(transactions)
}

/// Parse a date string in the formats statements commonly use
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%d-%b-%Y", // 15-Jan-2024
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
        "%d/%m/%Y", // 15/01/2024 (European)
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Largest number of fractional digits a statement amount may carry
const MAX_AMOUNT_SCALE: u32 = 2;

/// Parse an amount string, handling currency symbols, commas and
/// accounting-style parentheses for negatives
///
/// Amounts with more than two fractional digits are rejected: totals and
/// alerts are reported in cents.
pub(crate) fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .ok()
        .filter(|amount| amount.scale() <= MAX_AMOUNT_SCALE)
}
