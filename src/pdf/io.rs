//! Loading and saving documents
//!
//! Source files supplied by the caller get their failures classified
//! (missing, unparseable, empty). Scratch files written by this crate are
//! loaded without classification: a failure there is a lopdf error.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use lopdf::Document;
use tracing::debug;
use crate::error::{Error, Result};

/// Load a caller-supplied PDF
pub fn load_source(path: &Path) -> Result<Document> {
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    // Unreadable (permissions, races) counts as not found
    File::open(path).map_err(|_| Error::FileNotFound(path.to_path_buf()))?;

    let doc = Document::load(path).map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })?;

    if doc.get_pages().is_empty() {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    debug!(path = %path.display(), pages = doc.get_pages().len(), "loaded source PDF");
    Ok(doc)
}

/// Load a PDF this crate wrote itself
pub fn load_scratch(path: &Path) -> Result<Document> {
    Ok(Document::load(path)?)
}

/// Save `doc` through a buffered writer, optionally compressing streams first
pub fn save_document<W: Write>(doc: &mut Document, target: W, compress: bool) -> Result<()> {
    if compress {
        doc.compress();
    }

    let mut writer = BufWriter::new(target);
    doc.save_to(&mut writer)?;
    writer.flush()?;
    Ok(())
}
