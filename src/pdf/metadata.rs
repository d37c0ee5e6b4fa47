//! PDF metadata extraction

use std::path::Path;
use lopdf::{Document, Object};
use crate::error::Result;
use crate::pdf::io::load_source;

/// PDF metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Version from the file header, e.g. "1.5"
    pub version: String,
}

/// Read a text entry of the Info dictionary
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };

    let bytes = info.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Extract metadata from a loaded document
pub fn extract_metadata(doc: &Document) -> PdfMetadata {
    PdfMetadata {
        page_count: doc.get_pages().len(),
        title: info_string(doc, b"Title"),
        author: info_string(doc, b"Author"),
        version: doc.version.clone(),
    }
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = load_source(path)?;
    Ok(doc.get_pages().len())
}
