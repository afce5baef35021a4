// Thin wrappers over the PDF backends. Keep this module small.

use std::path::Path;

use lopdf::Document;

use super::ExtractError;

/// Loads a document for page-addressed access.
pub fn load(path: &Path) -> Result<Document, ExtractError> {
    Document::load(path).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// 1-based page numbers present in the document, in order.
pub fn page_numbers(doc: &Document) -> Vec<u32> {
    doc.get_pages().keys().copied().collect()
}

pub fn page_text(doc: &Document, page: u32) -> Result<String, ExtractError> {
    doc.extract_text(&[page])
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Whole-document text via pdf-extract. More lenient with odd encodings;
/// used when page-addressed reading fails.
pub fn full_text(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf(e.to_string()))
}
