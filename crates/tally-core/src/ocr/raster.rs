//! Page-image OCR over a PDF.

use tracing::{debug, info};

use crate::models::config::TallyConfig;
use crate::pdf::PdfExtractor;

use super::{ImagePreprocessor, OcrSource, PageRecognizer};

/// Recognizes the scanned image of every page in a document.
pub struct RasterOcr<R: PageRecognizer> {
    recognizer: R,
    pdf: PdfExtractor,
    preprocessor: ImagePreprocessor,
    row_tolerance: f32,
}

impl<R: PageRecognizer> RasterOcr<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            pdf: PdfExtractor::new(),
            preprocessor: ImagePreprocessor::new(),
            row_tolerance: 15.0,
        }
    }

    /// Apply page limits, image size and row tolerance from config.
    pub fn from_config(recognizer: R, config: &TallyConfig) -> Self {
        Self {
            recognizer,
            pdf: PdfExtractor::new().with_max_pages(config.pdf.max_pages),
            preprocessor: ImagePreprocessor::new().with_max_size(config.ocr.max_image_size),
            row_tolerance: config.ocr.row_tolerance,
        }
    }
}

impl<R: PageRecognizer> OcrSource for RasterOcr<R> {
    fn page_texts(&self, document: &[u8], dpi: u32) -> crate::Result<Vec<String>> {
        let pdf = self.pdf.load(document)?;
        let mut texts = Vec::new();

        for page in 1..=pdf.page_count() {
            let image = match pdf.page_image(page) {
                Ok(image) => image,
                Err(e) => {
                    debug!("Skipping page {} without a scanned image: {}", page, e);
                    continue;
                }
            };

            let page_size = pdf.page_size_points(page)?;
            let scaled = self.preprocessor.scale_to_dpi(&image, page_size, dpi);
            let result = self.recognizer.recognize(&scaled)?;

            let lines = result.lines(self.row_tolerance);
            debug!("Page {}: {} OCR lines", page, lines.len());
            texts.push(lines.join("\n"));
        }

        // A document without scans has nothing to recognize; that is an
        // empty result, not a failure.
        info!("Recognized {} of {} pages", texts.len(), pdf.page_count());
        Ok(texts)
    }
}
