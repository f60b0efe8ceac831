//! Parser for statements with an embedded text layer.

use tracing::{debug, trace};

use crate::models::transaction::collapse_whitespace;
use crate::models::Transaction;

use super::rules::{
    classify, is_expense, normalize_date, parse_amount, statement_year_or_current, KeywordTable,
    TEXT_TRANSACTION_LINE,
};
use super::LineParser;

/// Single-pass parser for text-layer rows.
///
/// Each row must carry a transaction date, a post date, a description and a
/// trailing amount with two decimals. Anything else (headers, footers, page
/// breaks) is skipped.
pub struct TextLineParser<'a> {
    table: &'a KeywordTable,
}

impl<'a> TextLineParser<'a> {
    pub fn new(table: &'a KeywordTable) -> Self {
        Self { table }
    }

    /// Parse with an explicit statement year for tokens that lack one.
    pub fn parse_with_year(&self, text: &str, source: &str, year: i32) -> Vec<Transaction> {
        let mut transactions = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            let Some(caps) = TEXT_TRANSACTION_LINE.captures(line) else {
                continue;
            };

            let Some(date) = normalize_date(&caps[1], year) else {
                trace!("Unparseable post date '{}' in row: {}", &caps[1], line);
                continue;
            };

            let Some(amount) = parse_amount(&caps[3]) else {
                trace!("Unparseable amount '{}' in row: {}", &caps[3], line);
                continue;
            };

            if !is_expense(amount) {
                trace!("Skipping credit row: {}", line);
                continue;
            }

            let description = collapse_whitespace(&caps[2]);
            let category = classify(&description, self.table);

            if let Some(txn) = Transaction::new(date, &description, amount, category, source) {
                transactions.push(txn);
            }
        }

        debug!(
            "Text layer parser found {} transactions in {}",
            transactions.len(),
            source
        );
        transactions
    }
}

impl LineParser for TextLineParser<'_> {
    fn parse(&self, text: &str, source: &str) -> Vec<Transaction> {
        let year = statement_year_or_current(text);
        self.parse_with_year(text, source, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_single_row() {
        let table = KeywordTable::default();
        let parser = TextLineParser::new(&table);

        let records = parser.parse_with_year("Jan 5 Jan 6 STARBUCKS MANILA  450.00", "jan.pdf", 2024);

        assert_eq!(records.len(), 1);
        let txn = &records[0];
        assert_eq!(txn.date(), NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(txn.description(), "STARBUCKS MANILA");
        assert_eq!(txn.amount(), Decimal::new(45000, 2));
        assert_eq!(txn.category(), Category::Dining);
        assert_eq!(txn.source(), "jan.pdf");
    }

    #[test]
    fn test_negative_amount_is_dropped() {
        let table = KeywordTable::default();
        let parser = TextLineParser::new(&table);

        let records =
            parser.parse_with_year("Jan 7 Jan 8 PAYMENT - THANK YOU -450.00", "jan.pdf", 2024);
        assert!(records.is_empty());
    }

    #[test]
    fn test_statement_text() {
        let text = r#"
            UNIONBANK CREDIT CARD STATEMENT
            Statement Date: February 2, 2024
            Sale Date  Post Date  Description              Amount
            Jan 5 Jan 6 STARBUCKS MANILA  450.00
            Jan 9 Jan 10 MERALCO   ONLINE   PAYMENT 3,210.75
            Jan 12 Jan 12 PAYMENT - THANK YOU -5,000.00
            14 Jan 15 Jan SOME SHOP 99.90
            Page 1 of 2
            Total Amount Due 8,760.65
        "#;

        let table = KeywordTable::default();
        let records = TextLineParser::new(&table).parse(text, "feb.pdf");

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date(), NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(records[1].description(), "MERALCO ONLINE PAYMENT");
        assert_eq!(records[1].amount(), Decimal::new(321075, 2));
        assert_eq!(records[1].category(), Category::Utilities);
        assert_eq!(records[2].date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(records[2].category(), Category::Uncategorized);
    }

    #[test]
    fn test_unparseable_date_skips_row() {
        let table = KeywordTable::default();
        let parser = TextLineParser::new(&table);

        let records = parser.parse_with_year("Ref 5 Foo 6 SOMETHING 12.00", "x.pdf", 2024);
        assert!(records.is_empty());
    }
}
