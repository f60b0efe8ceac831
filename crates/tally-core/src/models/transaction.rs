//! Transaction records and the category enumeration.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source label used for records entered by hand.
pub const MANUAL_SOURCE: &str = "Manual Entry";

/// Spending category assigned by keyword matching.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Category {
    Transport,
    Food,
    Utilities,
    Groceries,
    Health,
    Shopping,
    Entertainment,
    Dining,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    Fuel,
    Subscriptions,
    Travel,
    /// Sentinel for descriptions no keyword matched.
    #[default]
    Uncategorized,
}

impl Category {
    /// Every real category, in display order. Excludes the sentinel.
    pub const ALL: [Category; 12] = [
        Category::Transport,
        Category::Food,
        Category::Utilities,
        Category::Groceries,
        Category::Health,
        Category::Shopping,
        Category::Entertainment,
        Category::Dining,
        Category::PersonalCare,
        Category::Fuel,
        Category::Subscriptions,
        Category::Travel,
    ];

    /// Label of the sentinel category.
    pub const UNCATEGORIZED: &'static str = "Uncategorized";

    /// Human-readable label, also used on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Transport => "Transport",
            Category::Food => "Food",
            Category::Utilities => "Utilities",
            Category::Groceries => "Groceries",
            Category::Health => "Health",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Dining => "Dining",
            Category::PersonalCare => "Personal Care",
            Category::Fuel => "Fuel",
            Category::Subscriptions => "Subscriptions",
            Category::Travel => "Travel",
            Category::Uncategorized => Self::UNCATEGORIZED,
        }
    }

    /// Parse a category from its label, ignoring case and surrounding whitespace.
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(Self::UNCATEGORIZED) {
            return Some(Category::Uncategorized);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single expense line recovered from a statement.
///
/// Fields are read-only after construction. Amounts are never negative:
/// payments and credits are dropped before a record is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    date: NaiveDate,
    description: String,
    amount: Decimal,
    category: Category,
    source: String,
}

impl Transaction {
    /// Build a record. Returns `None` for negative amounts.
    pub fn new(
        date: NaiveDate,
        description: &str,
        amount: Decimal,
        category: Category,
        source: impl Into<String>,
    ) -> Option<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return None;
        }
        Some(Self {
            date,
            description: collapse_whitespace(description),
            amount,
            category,
            source: source.into(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Key used to recognise the same line imported twice.
    pub fn dedup_key(&self) -> (NaiveDate, &str, Decimal, &str) {
        (self.date, &self.description, self.amount, &self.source)
    }
}

/// Collapse internal whitespace runs to single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::from_label("dining"), Some(Category::Dining));
        assert_eq!(Category::from_label(" Personal Care "), Some(Category::PersonalCare));
        assert_eq!(Category::from_label("uncategorized"), Some(Category::Uncategorized));
        assert_eq!(Category::from_label("Gadgets"), None);
        assert_eq!(Category::PersonalCare.to_string(), "Personal Care");
    }

    #[test]
    fn test_category_serde_uses_labels() {
        let json = serde_json::to_string(&Category::PersonalCare).unwrap();
        assert_eq!(json, "\"Personal Care\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::PersonalCare);
    }

    #[test]
    fn test_all_excludes_sentinel() {
        assert!(!Category::ALL.contains(&Category::Uncategorized));
        assert_eq!(Category::default().label(), Category::UNCATEGORIZED);
    }

    #[test]
    fn test_transaction_rejects_negative_amount() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert!(Transaction::new(date, "REFUND", Decimal::new(-100, 2), Category::Uncategorized, "a.pdf").is_none());

        let zero = Transaction::new(date, "ADJ", Decimal::ZERO, Category::Uncategorized, "a.pdf");
        assert!(zero.is_some());
    }

    #[test]
    fn test_transaction_collapses_description() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let txn = Transaction::new(date, "  STARBUCKS   MANILA ", Decimal::new(45000, 2), Category::Dining, "a.pdf").unwrap();
        assert_eq!(txn.description(), "STARBUCKS MANILA");
    }
}
