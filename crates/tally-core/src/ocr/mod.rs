//! OCR fallback for scanned statements.
//!
//! [`RasterOcr`] pulls the scanned image of each page, scales it to the
//! configured DPI and hands it to a [`PageRecognizer`]. Recognized boxes are
//! regrouped into physical lines so the OCR line parser sees the statement
//! the way it was printed.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;
mod raster;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "native")]
pub use pure_engine::{LazyRecognizer, PureOcrEngine};
pub use raster::RasterOcr;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Turns one page image into text boxes.
pub trait PageRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;
}

impl<R: PageRecognizer + ?Sized> PageRecognizer for &R {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        (**self).recognize(image)
    }
}

/// Source of per-page text recognized from a document's scanned images.
pub trait OcrSource {
    /// Recognized text of each page, one physical line per text line.
    fn page_texts(&self, document: &[u8], dpi: u32) -> crate::Result<Vec<String>>;
}

impl<O: OcrSource + ?Sized> OcrSource for &O {
    fn page_texts(&self, document: &[u8], dpi: u32) -> crate::Result<Vec<String>> {
        (**self).page_texts(document, dpi)
    }
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub score: f32,
}

impl TextBox {
    /// Box from an axis-aligned rectangle.
    pub fn from_rect(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            bbox: [x, y, x + width, y, x + width, y + height, x, y + height],
            text: text.into(),
            score: 1.0,
        }
    }

    /// Get the center point of the bounding box.
    pub fn center(&self) -> (f32, f32) {
        let x = (self.bbox[0] + self.bbox[2] + self.bbox[4] + self.bbox[6]) / 4.0;
        let y = (self.bbox[1] + self.bbox[3] + self.bbox[5] + self.bbox[7]) / 4.0;
        (x, y)
    }

    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Detected and recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Full text (boxes joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Create an empty result.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            boxes: Vec::new(),
            text: String::new(),
            processing_time_ms: 0,
            image_size: (width, height),
        }
    }

    /// Regroup boxes into printed lines.
    ///
    /// Boxes whose vertical centers lie within `row_tolerance` pixels of the
    /// first box of a row join that row. Rows are read top to bottom and the
    /// boxes of each row left to right, joined by single spaces.
    pub fn lines(&self, row_tolerance: f32) -> Vec<String> {
        let mut boxes: Vec<&TextBox> = self
            .boxes
            .iter()
            .filter(|b| !b.text.trim().is_empty())
            .collect();
        boxes.sort_by(|a, b| a.center().1.total_cmp(&b.center().1));

        let mut rows: Vec<(f32, Vec<&TextBox>)> = Vec::new();
        for text_box in boxes {
            let y = text_box.center().1;
            match rows.last_mut() {
                Some((anchor, row)) if (y - *anchor).abs() <= row_tolerance => row.push(text_box),
                _ => rows.push((y, vec![text_box])),
            }
        }

        rows.into_iter()
            .map(|(_, mut row)| {
                row.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
                row.iter()
                    .map(|b| b.text.trim())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_box_geometry() {
        let text_box = TextBox::from_rect("GRAB", 10.0, 20.0, 40.0, 10.0);
        assert_eq!(text_box.center(), (30.0, 25.0));
        assert_eq!(text_box.rect(), (10.0, 20.0, 50.0, 30.0));
    }

    #[test]
    fn test_lines_groups_rows_and_orders_columns() {
        let result = OcrResult {
            boxes: vec![
                TextBox::from_rect("PHP 320.00", 400.0, 62.0, 90.0, 20.0),
                TextBox::from_rect("GRAB TRANSPORT", 150.0, 21.0, 120.0, 20.0),
                TextBox::from_rect("Mar 3, 2024", 10.0, 18.0, 100.0, 20.0),
                TextBox::from_rect("   ", 10.0, 40.0, 10.0, 10.0),
            ],
            text: String::new(),
            processing_time_ms: 0,
            image_size: (600, 100),
        };

        assert_eq!(
            result.lines(15.0),
            vec!["Mar 3, 2024 GRAB TRANSPORT".to_string(), "PHP 320.00".to_string()]
        );

        // A zero tolerance splits boxes that are not perfectly aligned
        assert_eq!(result.lines(0.0).len(), 3);
    }

    #[test]
    fn test_empty_result_has_no_lines() {
        assert!(OcrResult::empty(10, 10).lines(15.0).is_empty());
    }
}
