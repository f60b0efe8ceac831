//! Rule-based building blocks for statement line parsing.

pub mod amounts;
pub mod categories;
pub mod dates;
pub mod patterns;

pub use amounts::{format_amount, is_expense, parse_amount};
pub use categories::{classify, KeywordRule, KeywordTable};
pub use dates::{normalize_date, statement_year, statement_year_or_current};
pub use patterns::*;
