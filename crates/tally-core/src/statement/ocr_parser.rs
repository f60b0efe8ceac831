//! Parser for text recognized from scanned statements.
//!
//! OCR output often wraps one transaction over several physical lines, so
//! this parser keeps one transaction open at a time: a dated line opens it,
//! following lines extend its description, and a currency amount closes it.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::models::transaction::collapse_whitespace;
use crate::models::Transaction;

use super::rules::{
    classify, is_expense, normalize_date, parse_amount, statement_year_or_current, KeywordTable,
    DEFAULT_CURRENCY_AMOUNT, OCR_DATE_LINE,
};
use super::LineParser;

/// Descriptions containing any of these are statement-generated lines
/// (interest, finance charges, fees), not purchases.
const GENERATED_LINE_MARKERS: [&str; 3] = ["Interest", "Charge", "Fee"];

/// Transaction being assembled from consecutive OCR lines.
#[derive(Debug)]
struct PendingTransaction {
    date: NaiveDate,
    description: String,
    amount: Option<Decimal>,
}

impl PendingTransaction {
    fn open(date: NaiveDate, rest: &str) -> Self {
        let mut description = rest.trim().to_string();
        if !description.is_empty() {
            description.push(' ');
        }
        Self {
            date,
            description,
            amount: None,
        }
    }

    fn push_continuation(&mut self, text: &str) {
        self.description.push_str(text);
        self.description.push(' ');
    }
}

/// A flushed transaction waiting for the final categorization pass.
#[derive(Debug)]
struct Committed {
    date: NaiveDate,
    description: String,
    amount: Decimal,
}

/// State-machine parser for OCR text.
pub struct OcrLineParser<'a> {
    table: &'a KeywordTable,
    amount_pattern: &'a Regex,
}

impl<'a> OcrLineParser<'a> {
    /// Parser recognizing the default currency codes.
    pub fn new(table: &'a KeywordTable) -> Self {
        Self {
            table,
            amount_pattern: &DEFAULT_CURRENCY_AMOUNT,
        }
    }

    /// Use a custom currency amount pattern; group 1 must capture the amount.
    pub fn with_amount_pattern(mut self, pattern: &'a Regex) -> Self {
        self.amount_pattern = pattern;
        self
    }

    /// Parse with an explicit fallback year.
    pub fn parse_with_year(&self, text: &str, source: &str, year: i32) -> Vec<Transaction> {
        let mut pending: Option<PendingTransaction> = None;
        let mut committed: Vec<Committed> = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // A dated line always starts a new transaction, even if it also
            // carries an amount.
            if let Some(token) = OCR_DATE_LINE.captures(line).and_then(|caps| caps.get(1)) {
                match normalize_date(token.as_str(), year) {
                    Some(date) => {
                        flush(pending.take(), &mut committed);
                        pending = Some(PendingTransaction::open(date, &line[token.end()..]));
                    }
                    None => trace!("Skipping line with unparseable date: {}", line),
                }
                continue;
            }

            let Some(current) = pending.as_mut() else {
                continue;
            };

            match self.amount_pattern.captures(line) {
                Some(caps) => {
                    let marker_start = caps.get(0).map_or(0, |m| m.start());
                    let leftover = line[..marker_start].trim();
                    if !leftover.is_empty() {
                        current.push_continuation(leftover);
                    }

                    match parse_amount(&caps[1]) {
                        Some(amount) if is_expense(amount) => current.amount = Some(amount),
                        Some(amount) => trace!("Discarding credit amount {}", amount),
                        None => trace!("Unparseable amount '{}'", &caps[1]),
                    }
                }
                None => current.push_continuation(line),
            }
        }

        flush(pending.take(), &mut committed);

        let transactions: Vec<Transaction> = committed
            .into_iter()
            .filter_map(|c| {
                let category = classify(&c.description, self.table);
                Transaction::new(c.date, &c.description, c.amount, category, source)
            })
            .collect();

        debug!(
            "OCR parser found {} transactions in {}",
            transactions.len(),
            source
        );
        transactions
    }
}

impl LineParser for OcrLineParser<'_> {
    fn parse(&self, text: &str, source: &str) -> Vec<Transaction> {
        let year = statement_year_or_current(text);
        self.parse_with_year(text, source, year)
    }
}

/// Commit a pending transaction if it is closed and not statement-generated.
fn flush(pending: Option<PendingTransaction>, committed: &mut Vec<Committed>) {
    let Some(pending) = pending else {
        return;
    };

    let Some(amount) = pending.amount else {
        trace!("Dropping transaction without amount: {}", pending.description.trim());
        return;
    };

    let description = collapse_whitespace(&pending.description);
    if GENERATED_LINE_MARKERS
        .iter()
        .any(|marker| description.contains(marker))
    {
        trace!("Dropping statement-generated line: {}", description);
        return;
    }

    committed.push(Committed {
        date: pending.date,
        description,
        amount,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::statement::rules::currency_amount_pattern;
    use pretty_assertions::assert_eq;

    fn parse(lines: &[&str]) -> Vec<Transaction> {
        let table = KeywordTable::default();
        OcrLineParser::new(&table).parse_with_year(&lines.join("\n"), "ub.pdf", 2024)
    }

    #[test]
    fn test_date_line_then_amount_line() {
        let records = parse(&["Mar 3, 2024 GRAB TRANSPORT", "PHP 320.00"]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date(), NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(records[0].description(), "GRAB TRANSPORT");
        assert_eq!(records[0].amount(), Decimal::new(32000, 2));
        assert_eq!(records[0].category(), Category::Transport);
        assert_eq!(records[0].source(), "ub.pdf");
    }

    #[test]
    fn test_fee_lines_are_dropped() {
        let records = parse(&[
            "Mar 4, 2024 LATE PAYMENT Fee",
            "PHP 1,500.00",
            "Mar 5, 2024 FINANCE Charge",
            "PHP 12.40",
            "Mar 6, 2024 Interest ON BALANCE",
            "PHP 80.00",
        ]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_date_line_without_amount_is_dropped() {
        let records = parse(&[
            "Mar 3, 2024 GRAB TRANSPORT",
            "Mar 4, 2024 STARBUCKS BGC",
            "PHP 210.00",
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description(), "STARBUCKS BGC");
        assert_eq!(records[0].date(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn test_wrapped_description() {
        let records = parse(&[
            "Mar 7, 2024 PHILIPPINE",
            "AIRLINES   MANILA",
            "TICKET 0791 PHP 12,345.60",
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description(), "PHILIPPINE AIRLINES MANILA TICKET 0791");
        assert_eq!(records[0].amount(), Decimal::new(1234560, 2));
        assert_eq!(records[0].category(), Category::Travel);
    }

    #[test]
    fn test_negative_amount_keeps_description_but_not_amount() {
        let records = parse(&["Mar 8, 2024 PAYMENT RECEIVED", "THANK YOU PHP -5,000.00"]);
        assert!(records.is_empty());

        // A later positive amount still closes the transaction.
        let records = parse(&[
            "Mar 8, 2024 SHOPEE",
            "REFUND PHP -100.00",
            "ORDER PHP 450.00",
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description(), "SHOPEE REFUND ORDER");
        assert_eq!(records[0].amount(), Decimal::new(45000, 2));
    }

    #[test]
    fn test_line_with_date_and_amount_is_date_line() {
        let records = parse(&["Mar 9, 2024 NETFLIX PHP 549.00"]);
        assert!(records.is_empty());

        let records = parse(&["Mar 9, 2024 NETFLIX PHP 549.00", "PHP 549.00"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description(), "NETFLIX PHP 549.00");
    }

    #[test]
    fn test_lines_before_first_date_are_ignored() {
        let records = parse(&[
            "UNIONBANK",
            "PHP 9,999.00",
            "",
            "Mar 10, 2024 PETRON EDSA",
            "PHP 2,000.00",
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category(), Category::Fuel);
    }

    #[test]
    fn test_no_date_lines_yields_nothing() {
        assert!(parse(&["STATEMENT OF ACCOUNT", "PHP 100.00"]).is_empty());
        assert!(parse(&[]).is_empty());
    }

    #[test]
    fn test_custom_currency_codes() {
        let table = KeywordTable::default();
        let pattern = currency_amount_pattern(&["USD"]).unwrap();
        let parser = OcrLineParser::new(&table).with_amount_pattern(&pattern);

        let text = "Apr 1, 2024 GOOGLE STORAGE\nUSD 2.99";
        let records = parser.parse(text, "card.pdf");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category(), Category::Subscriptions);
        assert_eq!(records[0].date(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }
}
