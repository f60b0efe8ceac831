//! Statement transaction extraction.
//!
//! Two line parsers share the same output type: [`TextLineParser`] for text
//! recovered from the embedded text layer, and [`OcrLineParser`] for text
//! recognized from rasterized pages. [`StatementExtractor`] tries the text
//! layer first and only falls back to OCR when that yields nothing.

mod extractor;
mod ocr_parser;
pub mod rules;
mod text_parser;

pub use extractor::StatementExtractor;
pub use ocr_parser::OcrLineParser;
pub use text_parser::TextLineParser;

use std::fmt;

use serde::Serialize;

use crate::error::TallyError;
use crate::models::Transaction;

/// Trait for statement line parsers.
pub trait LineParser {
    /// Parse every transaction in `text`, tagging records with `source`.
    fn parse(&self, text: &str, source: &str) -> Vec<Transaction>;
}

/// Text recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Embedded text layer.
    TextLayer,
    /// Rasterized pages run through OCR.
    Ocr,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::TextLayer => f.write_str("text layer"),
            Strategy::Ocr => f.write_str("OCR"),
        }
    }
}

/// Why a document, or one stage of it, produced no records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The document is encrypted and could not be opened.
    PasswordProtected,
    /// A stage failed for another reason.
    StageFailed { strategy: Strategy, reason: String },
    /// Every stage ran but none found a transaction.
    NoTransactions,
}

impl Diagnostic {
    /// Map a stage error to a diagnostic.
    pub fn from_error(strategy: Strategy, err: &TallyError) -> Self {
        if err.is_encrypted() {
            Diagnostic::PasswordProtected
        } else {
            Diagnostic::StageFailed {
                strategy,
                reason: err.to_string(),
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::PasswordProtected => f.write_str("document is password protected"),
            Diagnostic::StageFailed { strategy, reason } => {
                write!(f, "{} extraction failed: {}", strategy, reason)
            }
            Diagnostic::NoTransactions => f.write_str("no transactions found"),
        }
    }
}

/// Result of a single extraction stage.
///
/// A failed stage is an empty stage with a diagnostic, so the dispatcher
/// only ever branches on whether records came back.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub strategy: Strategy,
    pub transactions: Vec<Transaction>,
    pub diagnostic: Option<Diagnostic>,
}

impl StageOutcome {
    pub fn succeeded(strategy: Strategy, transactions: Vec<Transaction>) -> Self {
        Self {
            strategy,
            transactions,
            diagnostic: None,
        }
    }

    pub fn failed(strategy: Strategy, err: &TallyError) -> Self {
        Self {
            strategy,
            transactions: Vec::new(),
            diagnostic: Some(Diagnostic::from_error(strategy, err)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    /// Records in statement order.
    pub transactions: Vec<Transaction>,
    /// Stage that produced the records, if any did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    /// Failure or emptiness reason, kept apart from the records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
}

impl ExtractionOutcome {
    /// Combine the stages that ran, in the order they ran.
    ///
    /// Records come from the first non-empty stage, and such an outcome
    /// carries no diagnostic. Otherwise a password-protected diagnostic
    /// outranks other failures, which outrank "no transactions".
    pub fn from_stages(stages: Vec<StageOutcome>) -> Self {
        let diagnostic = stages
            .iter()
            .filter_map(|s| s.diagnostic.as_ref())
            .find(|d| **d == Diagnostic::PasswordProtected)
            .or_else(|| stages.iter().find_map(|s| s.diagnostic.as_ref()))
            .cloned();

        match stages.into_iter().find(|s| !s.is_empty()) {
            Some(stage) => Self {
                transactions: stage.transactions,
                strategy: Some(stage.strategy),
                diagnostic: None,
            },
            None => Self {
                transactions: Vec::new(),
                strategy: None,
                diagnostic: diagnostic.or(Some(Diagnostic::NoTransactions)),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::models::Category;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn record() -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            "STARBUCKS",
            Decimal::new(45000, 2),
            Category::Dining,
            "jan.pdf",
        )
        .unwrap()
    }

    #[test]
    fn test_diagnostic_from_error() {
        let encrypted = TallyError::Pdf(PdfError::Encrypted);
        assert_eq!(
            Diagnostic::from_error(Strategy::TextLayer, &encrypted),
            Diagnostic::PasswordProtected
        );

        let broken = TallyError::Ocr(OcrError::ModelLoad("missing det.onnx".into()));
        let diag = Diagnostic::from_error(Strategy::Ocr, &broken);
        assert_eq!(
            diag.to_string(),
            "OCR extraction failed: OCR error: failed to load model: missing det.onnx"
        );
    }

    #[test]
    fn test_outcome_password_outranks_other_failures() {
        let stages = vec![
            StageOutcome::failed(Strategy::TextLayer, &TallyError::Pdf(PdfError::NoPages)),
            StageOutcome::failed(Strategy::Ocr, &TallyError::Pdf(PdfError::Encrypted)),
        ];
        let outcome = ExtractionOutcome::from_stages(stages);
        assert!(outcome.is_empty());
        assert_eq!(outcome.strategy, None);
        assert_eq!(outcome.diagnostic, Some(Diagnostic::PasswordProtected));
    }

    #[test]
    fn test_outcome_empty_stages_report_no_transactions() {
        let stages = vec![
            StageOutcome::succeeded(Strategy::TextLayer, Vec::new()),
            StageOutcome::succeeded(Strategy::Ocr, Vec::new()),
        ];
        let outcome = ExtractionOutcome::from_stages(stages);
        assert_eq!(outcome.diagnostic, Some(Diagnostic::NoTransactions));
    }

    #[test]
    fn test_outcome_takes_first_non_empty_stage() {
        let stages = vec![
            StageOutcome::failed(Strategy::TextLayer, &TallyError::Pdf(PdfError::NoPages)),
            StageOutcome::succeeded(Strategy::Ocr, vec![record()]),
        ];
        let outcome = ExtractionOutcome::from_stages(stages);
        assert_eq!(outcome.transactions, vec![record()]);
        assert_eq!(outcome.strategy, Some(Strategy::Ocr));
        assert_eq!(outcome.diagnostic, None);
    }
}
