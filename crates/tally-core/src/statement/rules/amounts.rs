//! Amount parsing and formatting for statement rows.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a printed amount such as `"1,234.56"` or `"-450.00"`.
///
/// Thousands separators and stray spaces are removed; anything that is not
/// then a plain decimal yields `None`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Whether an amount counts as an expense (payments and credits are negative).
pub fn is_expense(amount: Decimal) -> bool {
    !amount.is_sign_negative() || amount.is_zero()
}

/// Format amount with thousands separators and two decimals (1,234.56).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let (integer_part, decimal_part) = match digits.split_once('.') {
        Some(parts) => parts,
        None => return s,
    };

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    format!("{}{}.{}", sign, formatted, decimal_part)
}
