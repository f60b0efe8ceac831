//! PDF text and image extraction using lopdf and pdf-extract.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace, warn};

use super::{Result, TextLayerSource};
use crate::error::PdfError;

/// Default page size (US Letter) when a page has no readable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Opens statement PDFs.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    /// Pages processed per document; 0 means all.
    max_pages: usize,
}

/// A parsed, decrypted PDF document.
pub struct LoadedPdf {
    document: Document,
    raw_data: Vec<u8>,
    page_ids: Vec<ObjectId>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of pages processed per document (0 = no limit).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Parse a document, decrypting it if it only has an empty user password.
    pub fn load(&self, data: &[u8]) -> Result<LoadedPdf> {
        let mut doc = Document::load_mem(data).map_err(|e| {
            let message = e.to_string();
            if message.to_lowercase().contains("crypt") {
                PdfError::Encrypted
            } else {
                PdfError::Parse(message)
            }
        })?;

        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf_extract needs the decrypted bytes
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let mut page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(PdfError::NoPages);
        }
        if self.max_pages > 0 && page_ids.len() > self.max_pages {
            debug!(
                "Limiting PDF from {} to {} pages",
                page_ids.len(),
                self.max_pages
            );
            page_ids.truncate(self.max_pages);
        }

        debug!("Loaded PDF with {} pages", page_ids.len());
        Ok(LoadedPdf {
            document: doc,
            raw_data,
            page_ids,
        })
    }
}

impl TextLayerSource for PdfExtractor {
    fn page_texts(&self, document: &[u8]) -> Result<Vec<String>> {
        self.load(document)?.page_texts()
    }
}

impl LoadedPdf {
    /// Number of pages that will be processed.
    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    /// Embedded text of each page.
    ///
    /// pdf_extract panics on some malformed documents; those panics are
    /// reported as text extraction errors.
    pub fn page_texts(&self) -> Result<Vec<String>> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
        }));

        let mut pages = match result {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => return Err(PdfError::TextExtraction(e.to_string())),
            Err(_) => {
                return Err(PdfError::TextExtraction(
                    "text extraction panicked (malformed document)".to_string(),
                ))
            }
        };

        pages.truncate(self.page_ids.len());
        trace!(
            "Extracted {} chars of text from {} pages",
            pages.iter().map(String::len).sum::<usize>(),
            pages.len()
        );
        Ok(pages)
    }

    /// Page size in PDF points (1/72 inch), from the page's MediaBox.
    pub fn page_size_points(&self, page: u32) -> Result<(f32, f32)> {
        let page_id = self.page_id(page)?;

        let size = self
            .inherited_attribute(page_id, b"MediaBox")
            .and_then(|media_box| media_box_size(&self.document, &media_box));

        Ok(size.unwrap_or_else(|| {
            trace!("Page {} has no usable MediaBox, assuming Letter", page);
            DEFAULT_PAGE_SIZE
        }))
    }

    /// Raster image for a scanned page (1-indexed).
    ///
    /// Uses the largest image XObject on the page. Some scanners do not
    /// attach images to pages properly, so when the page has none the n-th
    /// image in the whole document is used instead.
    pub fn page_image(&self, page: u32) -> Result<DynamicImage> {
        let page_id = self.page_id(page)?;

        let largest = self
            .page_images(page_id)
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()));
        if let Some(image) = largest {
            return Ok(image);
        }

        debug!("No XObject images found on page {}, scanning all objects", page);
        self.all_images()
            .into_iter()
            .nth((page - 1) as usize)
            .ok_or_else(|| PdfError::ImageExtraction(format!("no image for page {}", page)))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        if page == 0 {
            return Err(PdfError::InvalidPage(page));
        }
        self.page_ids
            .get((page - 1) as usize)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    fn page_images(&self, page_id: ObjectId) -> Vec<DynamicImage> {
        let doc = &self.document;
        let mut images = Vec::new();

        let Some(Object::Dictionary(resources)) = self.inherited_attribute(page_id, b"Resources")
        else {
            return images;
        };

        if let Ok(xobjects) = resources.get(b"XObject") {
            if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                for (_name, obj_ref) in xobj_dict.iter() {
                    if let Ok((_, obj)) = doc.dereference(obj_ref) {
                        if let Some(img) = try_extract_image_from_object(doc, obj) {
                            images.push(img);
                        }
                    }
                }
            }
        }

        trace!("Found {} XObject images on page", images.len());
        images
    }

    fn all_images(&self) -> Vec<DynamicImage> {
        let images: Vec<DynamicImage> = self
            .document
            .objects
            .values()
            .filter_map(|object| try_extract_image_from_object(&self.document, object))
            .collect();

        debug!("Found {} images in document", images.len());
        images
    }

    /// Look up a page attribute, following the Parent chain for inheritable
    /// keys such as Resources and MediaBox. The value is dereferenced.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let doc = &self.document;
        let mut node_id = page_id;
        let mut visited: HashSet<ObjectId> = HashSet::new();

        while visited.insert(node_id) {
            let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
                return None;
            };

            if let Ok(value) = dict.get(key) {
                return doc.dereference(value).ok().map(|(_, obj)| obj.clone());
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }

        warn!("Cycle in page tree while looking up {}", String::from_utf8_lossy(key));
        None
    }
}

fn media_box_size(doc: &Document, media_box: &Object) -> Option<(f32, f32)> {
    let Object::Array(values) = media_box else {
        return None;
    };
    if values.len() != 4 {
        return None;
    }

    let coords: Vec<f32> = values
        .iter()
        .filter_map(|v| doc.dereference(v).ok().and_then(|(_, obj)| number(obj)))
        .collect();
    if coords.len() != 4 {
        return None;
    }

    let width = (coords[2] - coords[0]).abs();
    let height = (coords[3] - coords[1]).abs();
    (width > 0.0 && height > 0.0).then_some((width, height))
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn try_extract_image_from_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    let subtype = dict.get(b"Subtype").ok()?;
    if subtype.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) if !arr.is_empty() => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                // JPEG data is stored as-is
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter: {:?}", filter_name.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8) as u8;

    create_image_from_raw(&data, width, height, color_space, bits)
}

fn create_image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = width as usize * height as usize;
    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => data[..pixels * 3]
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => data[..pixels]
            .iter()
            .flat_map(|&gray| [gray, gray, gray, 255])
            .collect(),
        _ => {
            trace!(
                "Could not decode image: colorspace={:?}, data_len={}, pixels={}",
                String::from_utf8_lossy(color_space),
                data.len(),
                pixels
            );
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
