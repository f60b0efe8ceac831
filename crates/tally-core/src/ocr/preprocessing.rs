//! Image preprocessing for OCR.

use image::{DynamicImage, GenericImageView};
use tracing::debug;

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Scales page images before recognition.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Maximum image dimension.
    max_size: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self { max_size: 4096 }
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Resample a scanned page so it matches `dpi` at the page's printed size.
    ///
    /// `page_size` is in PDF points. The result never exceeds the maximum
    /// dimension; a `dpi` of 0 keeps the native resolution.
    pub fn scale_to_dpi(&self, image: &DynamicImage, page_size: (f32, f32), dpi: u32) -> DynamicImage {
        let (width, height) = image.dimensions();

        let (target_width, target_height) = if dpi == 0 || page_size.0 <= 0.0 || page_size.1 <= 0.0 {
            (width, height)
        } else {
            let scale = dpi as f32 / POINTS_PER_INCH;
            (
                ((page_size.0 * scale).round() as u32).max(1),
                ((page_size.1 * scale).round() as u32).max(1),
            )
        };

        let (new_width, new_height) =
            self.calculate_resize_dimensions(target_width, target_height, self.max_size);

        if (new_width, new_height) == (width, height) {
            return image.clone();
        }

        debug!(
            "Resampling page image {}x{} -> {}x{} ({} dpi)",
            width, height, new_width, new_height, dpi
        );
        image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
    }

    fn calculate_resize_dimensions(
        &self,
        width: u32,
        height: u32,
        target_size: u32,
    ) -> (u32, u32) {
        let max_dim = width.max(height);

        if max_dim <= target_size {
            return (width, height);
        }

        let scale = target_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        (new_width.max(1), new_height.max(1))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_resize_dimensions() {
        let preprocessor = ImagePreprocessor::new();

        // Image smaller than target
        let (w, h) = preprocessor.calculate_resize_dimensions(500, 300, 960);
        assert_eq!((w, h), (500, 300));

        // Image larger than target
        let (w, h) = preprocessor.calculate_resize_dimensions(1920, 1080, 960);
        assert_eq!(w, 960);
        assert!(h < 960);
    }

    #[test]
    fn test_scale_to_dpi() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(85, 110, Luma([255])));
        let preprocessor = ImagePreprocessor::new();

        // Letter page at 100 dpi
        let scaled = preprocessor.scale_to_dpi(&page, (612.0, 792.0), 100);
        assert_eq!(scaled.dimensions(), (850, 1100));

        let native = preprocessor.scale_to_dpi(&page, (612.0, 792.0), 0);
        assert_eq!(native.dimensions(), (85, 110));
    }

    #[test]
    fn test_scale_to_dpi_respects_max_size() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(85, 110, Luma([255])));
        let preprocessor = ImagePreprocessor::new().with_max_size(550);

        let scaled = preprocessor.scale_to_dpi(&page, (612.0, 792.0), 100);
        assert_eq!(scaled.dimensions(), (425, 550));
    }
}
