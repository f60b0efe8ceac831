//! PDF processing module.

mod extractor;

pub use extractor::{LoadedPdf, PdfExtractor};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Source of per-page text from a document's embedded text layer.
pub trait TextLayerSource {
    /// Text of each page, in page order. Scanned pages yield empty strings.
    fn page_texts(&self, document: &[u8]) -> Result<Vec<String>>;
}

impl<T: TextLayerSource + ?Sized> TextLayerSource for &T {
    fn page_texts(&self, document: &[u8]) -> Result<Vec<String>> {
        (**self).page_texts(document)
    }
}
