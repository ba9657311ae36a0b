//! PDF document access built on lopdf, with pdf-extract as the text-layer
//! fallback.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::Result;
use crate::error::PdfError;

/// Loaded PDF document.
pub struct PdfExtractor {
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Load a PDF from bytes. Encrypted documents are decrypted with an
    /// empty password where possible; anything else is fatal.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document =
            Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!("loaded PDF with {} pages", document.get_pages().len());

        Ok(Self { document, raw_data })
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Embedded text layer of one page (1-indexed).
    pub fn page_text(&self, page: u32) -> Result<String> {
        match self.document.extract_text(&[page]) {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!(page, error = %e, "lopdf page text failed, splitting full text");
                self.split_full_text(page)
            }
        }
    }

    /// Whole-document text via pdf-extract, apportioned to a page by line
    /// count. Coarse, but only used when per-page decoding fails.
    fn split_full_text(&self, page: u32) -> Result<String> {
        let full = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let lines: Vec<&str> = full.lines().collect();
        let page_count = self.page_count() as usize;
        if page_count == 0 {
            return Ok(String::new());
        }

        let per_page = lines.len() / page_count;
        let start = (page as usize - 1) * per_page;
        let end = page as usize * per_page;

        Ok(lines[start.min(lines.len())..end.min(lines.len())].join("\n"))
    }

    /// The page rendered as an image: the largest image embedded on the
    /// page. Scanned documents carry the whole page as one image object.
    pub fn page_image(&self, page: u32) -> Result<DynamicImage> {
        let images = self.page_images(page)?;

        images
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| PdfError::ImageExtraction(format!("no image on page {}", page)))
    }

    /// All decodable images embedded on a page.
    fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();

        if let Some(resources) = self.page_resources(page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobjects))) = self.document.dereference(xobjects) {
                    for (_, entry) in xobjects.iter() {
                        if let Ok((_, Object::Stream(stream))) = self.document.dereference(entry) {
                            if let Some(image) = self.image_from_stream(stream) {
                                images.push(image);
                            }
                        }
                    }
                }
            }
        }

        debug!(page, count = images.len(), "extracted page images");
        Ok(images)
    }

    /// Resources dictionary for a page, following Parent inheritance.
    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut node = self.document.get_object(page_id).ok()?;

        loop {
            let dict = node.as_dict().ok()?;

            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(resources))) =
                    self.document.dereference(resources)
                {
                    return Some(resources.clone());
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => {
                    node = self.document.get_object(*parent).ok()?;
                }
                _ => return None,
            }
        }
    }

    /// Decode an image XObject stream. JPEG streams decode directly; raw
    /// streams are interpreted as 8-bit RGB or grayscale by length.
    fn image_from_stream(&self, stream: &lopdf::Stream) -> Option<DynamicImage> {
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!(width, height, "image object");

        if let Ok(filter) = dict.get(b"Filter") {
            let name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(array) => array.first().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("unsupported image filter");
                    return None;
                }
                _ => {}
            }
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            return None;
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let gray_len = (width as usize) * (height as usize);
        let rgb_len = gray_len * 3;

        if data.len() >= rgb_len {
            RgbImage::from_raw(width, height, data[..rgb_len].to_vec())
                .map(DynamicImage::ImageRgb8)
        } else if data.len() >= gray_len {
            GrayImage::from_raw(width, height, data[..gray_len].to_vec())
                .map(DynamicImage::ImageLuma8)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        let result = PdfExtractor::load(b"definitely not a pdf");
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }
}
