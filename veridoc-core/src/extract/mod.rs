//! Text extraction from heterogeneous document files.
//!
//! Dispatches on the declared MIME type: plain text is read directly,
//! images are signalled for the visual comparison path, and PDFs have
//! their text layer extracted page by page with an optional OCR
//! fallback for scanned documents.

pub mod image;
pub mod pdf;

use crate::ocr::OcrAdapter;
use crate::provider::ProviderError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use self::image::{ImageNormalizer, NormalizeError, NormalizedImage};
pub use self::pdf::PdfError;

/// A document file handed to the pipeline: name, declared MIME type,
/// and raw bytes.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Builds a file inferring the MIME type from the name's extension.
    pub fn from_name(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_from_extension(&name).to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

fn mime_from_extension(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Outcome of text extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Extracted text, ready for comparison or retrieval.
    Text(String),
    /// An image document; text comes from the OCR/visual path instead.
    ImageDocument,
    /// A scanned document with no text layer and no OCR configured.
    /// Distinct from an empty success.
    NoExtractableText,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(#[from] PdfError),

    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("OCR fallback failed: {0}")]
    Ocr(#[from] ProviderError),
}

/// Converts a file blob into extractable text or a fallback signal.
#[derive(Clone, Default)]
pub struct TextExtractor {
    ocr: Option<Arc<OcrAdapter>>,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the OCR fallback for scanned documents.
    pub fn with_ocr(mut self, ocr: Arc<OcrAdapter>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub async fn extract(&self, file: &DocumentFile) -> Result<Extraction, ExtractError> {
        match file.mime_type.as_str() {
            "text/plain" => {
                let text = String::from_utf8(file.bytes.clone())?;
                Ok(Extraction::Text(text))
            }
            mime if mime.starts_with("image/") => Ok(Extraction::ImageDocument),
            "application/pdf" => self.extract_pdf(file).await,
            other => Err(ExtractError::UnsupportedFormat(other.to_string())),
        }
    }

    async fn extract_pdf(&self, file: &DocumentFile) -> Result<Extraction, ExtractError> {
        let text = pdf::extract_text(&file.bytes)?;
        if !text.trim().is_empty() {
            return Ok(Extraction::Text(text));
        }

        // No text layer: a scanned document. Fall back to OCR when
        // configured. Known gap: the whole file is submitted as a single
        // image, so only the first page of a multi-page scan is
        // recognized by the vision service.
        match &self.ocr {
            Some(ocr) => {
                let pages = pdf::page_count(&file.bytes).unwrap_or(1);
                if pages > 1 {
                    tracing::warn!(
                        name = %file.name,
                        pages,
                        "multi-page scan: OCR reads only the first page"
                    );
                }
                tracing::info!(name = %file.name, "no text layer, falling back to OCR");
                let encoded = BASE64_STANDARD.encode(&file.bytes);
                let recognized = ocr.recognize(&encoded).await?;
                if recognized.trim().is_empty() {
                    Ok(Extraction::NoExtractableText)
                } else {
                    Ok(Extraction::Text(recognized))
                }
            }
            None => Ok(Extraction::NoExtractableText),
        }
    }
}
