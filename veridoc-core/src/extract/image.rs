//! Image validation and normalization for OCR and visual reasoning.
//!
//! Bounds the byte/token cost of payloads sent to the vision and LLM
//! services: validates format and size, and downsamples oversized
//! images before re-encoding at fixed quality.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use thiserror::Error;

use super::DocumentFile;

const MAX_BYTES: usize = 10 * 1024 * 1024;
const MAX_WIDTH: u32 = 2048;
const JPEG_QUALITY: u8 = 85;

/// Raster formats accepted for candidate image documents.
const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("image of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// A validated, size-bounded image ready for an external service call.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub base64: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// Validates and normalizes image documents.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    max_bytes: usize,
    max_width: u32,
    jpeg_quality: u8,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            max_bytes: MAX_BYTES,
            max_width: MAX_WIDTH,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl ImageNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the file and returns a base64 payload.
    ///
    /// Images wider than the maximum are downsampled preserving aspect
    /// ratio and re-encoded as JPEG at fixed quality; anything else
    /// passes through untouched. Never silently truncates.
    pub fn process(&self, file: &DocumentFile) -> Result<NormalizedImage, NormalizeError> {
        if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            return Err(NormalizeError::UnsupportedFormat(file.mime_type.clone()));
        }
        if file.bytes.len() > self.max_bytes {
            return Err(NormalizeError::TooLarge {
                size: file.bytes.len(),
                max: self.max_bytes,
            });
        }

        let decoded = image::load_from_memory(&file.bytes).map_err(NormalizeError::Decode)?;
        let (width, height) = decoded.dimensions();

        if width <= self.max_width {
            return Ok(NormalizedImage {
                base64: BASE64_STANDARD.encode(&file.bytes),
                mime_type: file.mime_type.clone(),
                width,
                height,
            });
        }

        let scale = self.max_width as f32 / width as f32;
        let target_height = ((height as f32 * scale).round() as u32).max(1);
        let resized = decoded.resize(self.max_width, target_height, FilterType::CatmullRom);
        let (final_width, final_height) = resized.dimensions();

        tracing::debug!(
            name = %file.name,
            from = width,
            to = final_width,
            "downsampled oversized image"
        );

        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
        resized
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(NormalizeError::Encode)?;

        Ok(NormalizedImage {
            base64: BASE64_STANDARD.encode(&buffer),
            mime_type: "image/jpeg".to_string(),
            width: final_width,
            height: final_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_file(width: u32, height: u32) -> DocumentFile {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        DocumentFile {
            name: "test.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes,
        }
    }

    #[test]
    fn rejects_disallowed_mime_type() {
        let file = DocumentFile {
            name: "doc.tiff".to_string(),
            mime_type: "image/tiff".to_string(),
            bytes: vec![0u8; 16],
        };
        let result = ImageNormalizer::new().process(&file);
        assert!(matches!(result, Err(NormalizeError::UnsupportedFormat(_))));
    }

    #[test]
    fn rejects_oversized_payload() {
        let file = DocumentFile {
            name: "big.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![0u8; MAX_BYTES + 1],
        };
        let result = ImageNormalizer::new().process(&file);
        assert!(matches!(result, Err(NormalizeError::TooLarge { .. })));
    }

    #[test]
    fn small_image_passes_through_with_original_mime() {
        let file = png_file(100, 60);
        let normalized = ImageNormalizer::new().process(&file).unwrap();
        assert_eq!(normalized.mime_type, "image/png");
        assert_eq!((normalized.width, normalized.height), (100, 60));
        assert_eq!(
            BASE64_STANDARD.decode(&normalized.base64).unwrap(),
            file.bytes
        );
    }

    #[test]
    fn wide_image_is_downsampled_preserving_aspect() {
        let file = png_file(4096, 2048);
        let normalized = ImageNormalizer::new().process(&file).unwrap();
        assert_eq!(normalized.mime_type, "image/jpeg");
        assert_eq!(normalized.width, 2048);
        assert_eq!(normalized.height, 1024);
    }
}
