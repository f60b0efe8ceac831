//! In-memory ledger of extracted and manually entered transactions.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EntryError;
use crate::models::transaction::MANUAL_SOURCE;
use crate::models::{Category, Transaction};
use crate::statement::rules::parse_amount;

/// A transaction typed in by hand, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualEntry {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub description: String,
    /// Decimal amount, thousands separators allowed.
    pub amount: String,
    /// Category label, e.g. `"Personal Care"`.
    pub category: String,
}

impl ManualEntry {
    /// Validate the entry and build a record tagged as manual.
    pub fn validate(&self) -> Result<Transaction, EntryError> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| EntryError::InvalidDate(self.date.clone()))?;

        let amount = parse_amount(&self.amount)
            .ok_or_else(|| EntryError::InvalidAmount(self.amount.clone()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(EntryError::NegativeAmount(self.amount.clone()));
        }

        if self.description.trim().is_empty() {
            return Err(EntryError::EmptyDescription);
        }

        let category = Category::from_label(&self.category)
            .ok_or_else(|| EntryError::UnknownCategory(self.category.clone()))?;

        Transaction::new(date, &self.description, amount, category, MANUAL_SOURCE)
            .ok_or_else(|| EntryError::NegativeAmount(self.amount.clone()))
    }
}

/// Spending in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub count: usize,
    pub total: Decimal,
}

/// Per-category totals, in category order, plus the grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub categories: Vec<CategoryTotal>,
    pub count: usize,
    pub total: Decimal,
}

/// Ordered collection of transactions from any number of statements.
///
/// Records are kept newest first. Importing the same statement twice does
/// not duplicate its lines.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records, skipping exact duplicates on date, description, amount
    /// and source. Returns how many were added.
    pub fn merge<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut seen: HashSet<(NaiveDate, String, Decimal, String)> = self
            .transactions
            .iter()
            .map(owned_key)
            .collect();

        let before = self.transactions.len();
        for record in records {
            if seen.insert(owned_key(&record)) {
                self.transactions.push(record);
            }
        }
        let added = self.transactions.len() - before;

        // Stable sort keeps insertion order within a date
        self.transactions.sort_by(|a, b| b.date().cmp(&a.date()));

        debug!("Merged {} records into ledger ({} total)", added, self.transactions.len());
        added
    }

    /// Validate and add a manual entry. On error the ledger is unchanged.
    pub fn add_manual(&mut self, entry: &ManualEntry) -> Result<&Transaction, EntryError> {
        let record = entry.validate()?;
        let key = owned_key(&record);
        let position = self.transactions.iter().position(|t| owned_key(t) == key);

        let index = match position {
            Some(index) => index,
            None => {
                // After every record on or after this date
                let index = self
                    .transactions
                    .partition_point(|t| t.date() >= record.date());
                self.transactions.insert(index, record);
                index
            }
        };
        Ok(&self.transactions[index])
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn filter_category(&self, category: Category) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |t| t.category() == category)
    }

    pub fn summary(&self) -> LedgerSummary {
        let mut by_category: BTreeMap<Category, (usize, Decimal)> = BTreeMap::new();
        for txn in &self.transactions {
            let entry = by_category
                .entry(txn.category())
                .or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += txn.amount();
        }

        let categories: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, (count, total))| CategoryTotal {
                category,
                count,
                total,
            })
            .collect();

        LedgerSummary {
            count: self.transactions.len(),
            total: categories.iter().map(|c| c.total).sum(),
            categories,
        }
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

fn owned_key(t: &Transaction) -> (NaiveDate, String, Decimal, String) {
    let (date, description, amount, source) = t.dedup_key();
    (date, description.to_string(), amount, source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn txn(day: u32, description: &str, cents: i64, category: Category) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description,
            Decimal::new(cents, 2),
            category,
            "jan.pdf",
        )
        .unwrap()
    }

    fn entry(date: &str, description: &str, amount: &str, category: &str) -> ManualEntry {
        ManualEntry {
            date: date.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_merge_sorts_newest_first_and_dedups() {
        let mut ledger = Ledger::new();
        let added = ledger.merge(vec![
            txn(5, "GRAB", 20000, Category::Transport),
            txn(9, "STARBUCKS", 45000, Category::Dining),
            txn(5, "JOLLIBEE", 15000, Category::Food),
        ]);
        assert_eq!(added, 3);

        let again = ledger.merge(vec![txn(9, "STARBUCKS", 45000, Category::Dining)]);
        assert_eq!(again, 0);

        let descriptions: Vec<&str> = ledger.iter().map(|t| t.description()).collect();
        assert_eq!(descriptions, vec!["STARBUCKS", "GRAB", "JOLLIBEE"]);
    }

    #[test]
    fn test_merge_dedups_within_batch_but_not_across_sources() {
        let mut ledger = Ledger::new();
        let other_source = Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            "GRAB",
            Decimal::new(20000, 2),
            Category::Transport,
            "feb.pdf",
        )
        .unwrap();

        let added = ledger.merge(vec![
            txn(5, "GRAB", 20000, Category::Transport),
            txn(5, "GRAB", 20000, Category::Transport),
            other_source,
        ]);
        assert_eq!(added, 2);
    }

    #[test]
    fn test_add_manual() {
        let mut ledger = Ledger::new();
        ledger.merge(vec![
            txn(9, "STARBUCKS", 45000, Category::Dining),
            txn(2, "GRAB", 20000, Category::Transport),
        ]);

        let record = ledger
            .add_manual(&entry("2024-01-05", "  Barber  shop ", "1,250.50", "personal care"))
            .unwrap()
            .clone();
        assert_eq!(record.source(), MANUAL_SOURCE);
        assert_eq!(record.description(), "Barber shop");
        assert_eq!(record.amount(), Decimal::new(125050, 2));
        assert_eq!(record.category(), Category::PersonalCare);
        assert_eq!(ledger.transactions()[1], record);
    }

    #[test]
    fn test_add_manual_rejects_bad_input() {
        let mut ledger = Ledger::new();
        ledger.merge(vec![txn(9, "STARBUCKS", 45000, Category::Dining)]);

        let cases = [
            (entry("01/05/2024", "X", "1.00", "Food"), EntryError::InvalidDate("01/05/2024".into())),
            (entry("2024-01-05", "X", "abc", "Food"), EntryError::InvalidAmount("abc".into())),
            (entry("2024-01-05", "X", " , ", "Food"), EntryError::InvalidAmount(" , ".into())),
            (entry("2024-01-05", "X", "-3.00", "Food"), EntryError::NegativeAmount("-3.00".into())),
            (entry("2024-01-05", "  ", "3.00", "Food"), EntryError::EmptyDescription),
            (entry("2024-01-05", "X", "3.00", "Gadgets"), EntryError::UnknownCategory("Gadgets".into())),
        ];

        for (bad, expected) in cases {
            assert_eq!(ledger.add_manual(&bad).err(), Some(expected));
        }
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_filter_and_summary() {
        let mut ledger = Ledger::new();
        ledger.merge(vec![
            txn(1, "STARBUCKS", 45000, Category::Dining),
            txn(2, "CAFE", 12050, Category::Dining),
            txn(3, "GRAB", 20000, Category::Transport),
            txn(4, "MYSTERY", 999, Category::Uncategorized),
        ]);

        assert_eq!(ledger.filter_category(Category::Dining).count(), 2);
        assert_eq!(ledger.filter_category(Category::Fuel).count(), 0);

        let summary = ledger.summary();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.total, Decimal::new(78049, 2));
        assert_eq!(
            summary.categories,
            vec![
                CategoryTotal { category: Category::Transport, count: 1, total: Decimal::new(20000, 2) },
                CategoryTotal { category: Category::Dining, count: 2, total: Decimal::new(57050, 2) },
                CategoryTotal { category: Category::Uncategorized, count: 1, total: Decimal::new(999, 2) },
            ]
        );

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.summary().total, Decimal::ZERO);
    }
}
