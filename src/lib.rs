//! PDF Crunch Library
//!
//! Chainable page operations over PDF files, built on lopdf.
//! This library provides functionality to:
//! - Slice documents by page range, Python style (`-5..`, steps, reversal)
//! - Crop, scale and rotate pages
//! - Join page ranges from several documents
//! - Write results and verify them by checksum
//!
//! Each operation loads its input fresh and writes its output to a new
//! temporary file, so intermediate results never share lopdf state. The
//! temporary files are removed when their handles are dropped, when
//! [`Cruncher::close`] is called, or when a [`Cruncher::scoped`] block ends.
//!
//! # Example
//!
//! ```no_run
//! use pdf_crunch::{Bounds, Cruncher};
//!
//! let doc = Cruncher::open("slides.pdf")?;
//! let cover = Cruncher::open("cover.pdf")?;
//!
//! let handout = cover
//!     .join(&[&doc.slice(2..)?.scale_by(0.5)?])?
//!     .crop_to(Bounds::new().ymin(36.0))?;
//!
//! handout.write("handout.pdf")?;
//! # Ok::<(), pdf_crunch::Error>(())
//! ```

pub mod cruncher;
pub mod error;
pub mod pdf;
pub mod range;
mod scratch;
pub mod verify;

// Re-export commonly used items
pub use cruncher::Cruncher;
pub use error::{Error, Result};
pub use pdf::{Bounds, Matrix, PageInfo, PdfMetadata, Rect};
pub use range::{PageRange, Slice};
pub use scratch::CrunchOptions;
pub use verify::{hash_file, verify_file};
