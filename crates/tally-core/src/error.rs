//! Error types for the tally-core library.

use thiserror::Error;

/// Main error type for the tally library.
#[derive(Error, Debug)]
pub enum TallyError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Caller-supplied entry was rejected.
    #[error("invalid entry: {0}")]
    Entry(#[from] EntryError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TallyError {
    /// Whether this error means the document is password protected.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, TallyError::Pdf(PdfError::Encrypted))
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract page images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is password protected")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text detection or recognition failed.
    #[error("text detection failed: {0}")]
    Detection(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors for manually entered ledger records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    /// Date is not in `YYYY-MM-DD` form.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Amount is not a decimal number.
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    /// Amount is below zero.
    #[error("amount must not be negative: {0}")]
    NegativeAmount(String),

    /// Description is blank.
    #[error("description is empty")]
    EmptyDescription,

    /// Category label is not one of the known categories.
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}

/// Result type for the tally library.
pub type Result<T> = std::result::Result<T, TallyError>;
