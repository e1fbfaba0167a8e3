//! PDF text-layer extraction using lopdf.

use lopdf::Document;
use thiserror::Error;

/// Separator inserted between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to load PDF: {0}")]
    Load(#[source] lopdf::Error),

    #[error("failed to extract text from page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: lopdf::Error,
    },
}

/// Extracts the text layer of every page in order.
///
/// Returns the concatenated page texts. An empty or whitespace-only
/// result means the document has no text layer (a scanned document);
/// the caller decides whether to fall back to OCR.
pub fn extract_text(pdf_bytes: &[u8]) -> Result<String, PdfError> {
    let doc = Document::load_mem(pdf_bytes).map_err(PdfError::Load)?;

    let pages = doc.get_pages();
    let mut page_numbers: Vec<u32> = pages.keys().copied().collect();
    page_numbers.sort_unstable();

    let mut page_texts = Vec::with_capacity(page_numbers.len());
    for page_number in page_numbers {
        let text = doc
            .extract_text(&[page_number])
            .map_err(|source| PdfError::Page {
                page: page_number,
                source,
            })?;
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            page_texts.push(trimmed.to_string());
        }
    }

    Ok(page_texts.join(PAGE_SEPARATOR))
}

/// Number of pages in the document.
pub fn page_count(pdf_bytes: &[u8]) -> Result<usize, PdfError> {
    let doc = Document::load_mem(pdf_bytes).map_err(PdfError::Load)?;
    Ok(doc.get_pages().len())
}
