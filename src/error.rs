//! Error types for the PDF cruncher

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF cruncher
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error not otherwise classified
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found or not readable
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input could not be parsed as a PDF
    #[error("Not a readable PDF: {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Empty or out-of-bounds page range, or a degenerate rectangle
    #[error("Invalid range: {0}")]
    Range(String),

    /// Argument outside its domain (e.g. a non-positive scale factor)
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The handle's backing file or scratch directory is already gone
    #[error("Stale handle: {} has been cleaned up", .0.display())]
    StaleHandle(PathBuf),

    /// General error
    #[error("{0}")]
    General(String),
}
