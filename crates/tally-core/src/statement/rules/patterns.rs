//! Common regex patterns for statement line parsing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, TallyError};

lazy_static! {
    // Statement year: first standalone 20xx in the document
    pub static ref STATEMENT_YEAR: Regex = Regex::new(
        r"\b(20\d{2})\b"
    ).unwrap();

    // Text layer row: "<date> <post date> <description> <amount>"
    // Dates are "Jan 5" or "5 Jan"; only the post date is captured.
    pub static ref TEXT_TRANSACTION_LINE: Regex = Regex::new(
        r"^(?:\w+\s\d{1,2}|\d{1,2}\s\w{3})\s+(\w+\s\d{1,2}|\d{1,2}\s\w{3})\s+(.+?)\s+([\d,.\-]+\.\d{2})$"
    ).unwrap();

    // OCR row opening a transaction: "Mar 3, 2024 ..."
    pub static ref OCR_DATE_LINE: Regex = Regex::new(
        r"^([A-Za-z]{3,9}\s+\d{1,2},?\s+\d{4})\b"
    ).unwrap();

    pub static ref DEFAULT_CURRENCY_AMOUNT: Regex = currency_amount_pattern(&["PHP"]).unwrap();
}

/// Build the OCR amount pattern for a set of currency codes.
///
/// Captures the signed amount (two decimals) following any of the codes.
pub fn currency_amount_pattern<S: AsRef<str>>(codes: &[S]) -> Result<Regex> {
    let alternatives = codes
        .iter()
        .map(|c| regex::escape(c.as_ref().trim()))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("|");

    if alternatives.is_empty() {
        return Err(TallyError::Config("no currency codes configured".to_string()));
    }

    Regex::new(&format!(r"\b(?:{})\s*(-?[\d,]*\d\.\d{{2}})\b", alternatives))
        .map_err(|e| TallyError::Config(format!("invalid currency pattern: {}", e)))
}
