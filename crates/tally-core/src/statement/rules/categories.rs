//! Keyword-based category classification.
//!
//! Matching is plain substring search over the lower-cased description, and
//! the first rule in table order wins. Short keywords therefore match inside
//! longer words: `"sm"` hits "SM SUPERMARKET" but also "SMITH" and "SMALL".

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Default keyword rules, in priority order.
const DEFAULT_RULES: [(&str, Category); 23] = [
    ("grab", Category::Transport),
    ("mcdonald", Category::Food),
    ("jollibee", Category::Food),
    ("meralco", Category::Utilities),
    ("globe", Category::Utilities),
    ("sm", Category::Groceries),
    ("watsons", Category::Health),
    ("7-eleven", Category::Groceries),
    ("shopee", Category::Shopping),
    ("lazada", Category::Shopping),
    ("netflix", Category::Entertainment),
    ("venchi", Category::Dining),
    ("rustic", Category::Dining),
    ("barbers", Category::PersonalCare),
    ("petron", Category::Fuel),
    ("google", Category::Subscriptions),
    ("manam", Category::Dining),
    ("philippine airl", Category::Travel),
    ("hotel", Category::Travel),
    ("landers", Category::Groceries),
    ("starbucks", Category::Dining),
    ("waltermart", Category::Groceries),
    ("cafe", Category::Dining),
];

lazy_static! {
    static ref BUILTIN_TABLE: KeywordTable = KeywordTable::from_rules(
        DEFAULT_RULES.iter().map(|(k, c)| KeywordRule::new(*k, *c))
    );
}

/// One keyword → category rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Substring searched for in the lower-cased description.
    pub keyword: String,
    /// Category assigned on a hit.
    pub category: Category,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, category: Category) -> Self {
        Self {
            keyword: keyword.into(),
            category,
        }
    }
}

/// Ordered, read-only keyword table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
}

impl KeywordTable {
    /// Build a table, lower-casing keywords and dropping blank ones.
    /// Rule order is kept as given.
    pub fn from_rules(rules: impl IntoIterator<Item = KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                let keyword = rule.keyword.trim().to_lowercase();
                (!keyword.is_empty()).then(|| KeywordRule::new(keyword, rule.category))
            })
            .collect();
        Self { rules }
    }

    /// Shared built-in table.
    pub fn builtin() -> &'static KeywordTable {
        &BUILTIN_TABLE
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Category of the first rule whose keyword occurs in `description`.
    pub fn classify(&self, description: &str) -> Category {
        classify(description, self)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        BUILTIN_TABLE.clone()
    }
}

/// Classify a description against a keyword table.
pub fn classify(description: &str, table: &KeywordTable) -> Category {
    let lowered = description.to_lowercase();
    table
        .rules
        .iter()
        .find(|rule| lowered.contains(rule.keyword.as_str()))
        .map(|rule| rule.category)
        .unwrap_or(Category::Uncategorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_matches() {
        let table = KeywordTable::builtin();
        assert_eq!(table.len(), 23);
        assert_eq!(classify("STARBUCKS MANILA", table), Category::Dining);
        assert_eq!(classify("GRAB TRANSPORT", table), Category::Transport);
        assert_eq!(classify("Philippine Airlines", table), Category::Travel);
        assert_eq!(classify("BARBERS CUT", table), Category::PersonalCare);
        assert_eq!(classify("UNKNOWN MERCHANT", table), Category::Uncategorized);
    }

    #[test]
    fn test_first_registered_keyword_wins() {
        let table = KeywordTable::from_rules([
            KeywordRule::new("cafe", Category::Dining),
            KeywordRule::new("hotel", Category::Travel),
        ]);
        assert_eq!(table.classify("HOTEL CAFE LOBBY"), Category::Dining);

        let reversed = KeywordTable::from_rules([
            KeywordRule::new("hotel", Category::Travel),
            KeywordRule::new("cafe", Category::Dining),
        ]);
        assert_eq!(reversed.classify("HOTEL CAFE LOBBY"), Category::Travel);
    }

    #[test]
    fn test_substring_matching_is_not_word_bounded() {
        // "sm" sits ahead of "starbucks" and matches inside other words
        let table = KeywordTable::builtin();
        assert_eq!(table.classify("SMITH HARDWARE"), Category::Groceries);
        assert_eq!(table.classify("PETRON SMALL BAY"), Category::Groceries);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let table = KeywordTable::default();
        let first = table.classify("Netflix.com");
        assert_eq!(first, table.classify("Netflix.com"));
        assert_eq!(first, Category::Entertainment);
    }

    #[test]
    fn test_from_rules_normalizes_keywords() {
        let table = KeywordTable::from_rules([
            KeywordRule::new("  UBER ", Category::Transport),
            KeywordRule::new("   ", Category::Food),
        ]);
        assert_eq!(table.rules(), &[KeywordRule::new("uber", Category::Transport)]);
        assert!(KeywordTable::from_rules(Vec::new()).is_empty());
    }
}
