//! Date normalization for statement rows.

use chrono::{Datelike, Local, NaiveDate};

use super::patterns::STATEMENT_YEAR;

/// Formats tried in order: "January 5 2024", "Jan 5 2024", "5 Jan 2024".
const DATE_FORMATS: [&str; 3] = ["%B %d %Y", "%b %d %Y", "%d %b %Y"];

/// Parse a statement date token such as `"Jan 5"`, `"5 Jan"` or `"Jan 5, 2024"`.
///
/// Tokens without a year get `fallback_year`. Returns `None` when no format
/// matches; callers skip the row.
pub fn normalize_date(raw: &str, fallback_year: i32) -> Option<NaiveDate> {
    let token = raw.replace(',', "");
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let candidate = if token.split_whitespace().count() < 3 {
        format!("{} {}", token, fallback_year)
    } else {
        token.to_string()
    };

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&candidate, fmt).ok())
}

/// First standalone `20xx` year in the document text.
pub fn statement_year(text: &str) -> Option<i32> {
    STATEMENT_YEAR
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Statement year, or the current calendar year when the text has none.
pub fn statement_year_or_current(text: &str) -> i32 {
    statement_year(text).unwrap_or_else(|| Local::now().year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_day_uses_fallback_year() {
        for year in [2019, 2024, 2031] {
            assert_eq!(normalize_date("Jan 5", year), Some(ymd(year, 1, 5)));
            assert_eq!(normalize_date("5 Jan", year), Some(ymd(year, 1, 5)));
            assert_eq!(normalize_date("December 31", year), Some(ymd(year, 12, 31)));
        }
    }

    #[test]
    fn test_explicit_year_wins() {
        assert_eq!(normalize_date("Mar 3, 2024", 1999), Some(ymd(2024, 3, 3)));
        assert_eq!(normalize_date("March 3 2023", 1999), Some(ymd(2023, 3, 3)));
        assert_eq!(normalize_date("  3 Mar 2022, ", 1999), Some(ymd(2022, 3, 3)));
    }

    #[test]
    fn test_unparseable_tokens() {
        assert_eq!(normalize_date("", 2024), None);
        assert_eq!(normalize_date("Page 3", 2024), None);
        assert_eq!(normalize_date("Feb 30", 2024), None);
        assert_eq!(normalize_date("Foo 3, 2024", 2024), None);
    }

    #[test]
    fn test_statement_year() {
        assert_eq!(statement_year("Statement Date: March 15, 2024\nPage 1"), Some(2024));
        assert_eq!(statement_year("Ref 120245 Card 4020"), None);
        assert_eq!(statement_year("no year here"), None);
    }

    #[test]
    fn test_statement_year_or_current() {
        assert_eq!(statement_year_or_current("Period 2023"), 2023);
        assert_eq!(statement_year_or_current("Jan 5 Jan 6 X 1.00"), Local::now().year());
    }
}
