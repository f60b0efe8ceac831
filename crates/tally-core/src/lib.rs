//! Core library for bank statement transaction extraction.
//!
//! This crate provides:
//! - PDF processing (text layer and embedded page images)
//! - OCR fallback for scanned statements using pure-onnx-ocr
//! - Statement line parsing (dates, amounts, keyword categories)
//! - An in-memory ledger with dedup and per-category summaries

pub mod error;
pub mod ledger;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod statement;

pub use error::{EntryError, OcrError, PdfError, Result, TallyError};
pub use ledger::{CategoryTotal, Ledger, LedgerSummary, ManualEntry};
pub use models::{Category, TallyConfig, Transaction};
pub use ocr::{OcrResult, OcrSource, PageRecognizer, RasterOcr, TextBox};
#[cfg(feature = "native")]
pub use ocr::{LazyRecognizer, PureOcrEngine};
pub use pdf::{PdfExtractor, TextLayerSource};
pub use statement::rules::{KeywordRule, KeywordTable};
pub use statement::{
    Diagnostic, ExtractionOutcome, LineParser, OcrLineParser, StageOutcome, StatementExtractor,
    Strategy, TextLineParser,
};
