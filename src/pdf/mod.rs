//! PDF manipulation module

pub mod io;
pub mod merge;
pub mod metadata;
pub mod page;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use merge::{assemble, PageSelection};
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
pub use page::{Bounds, Matrix, PageInfo, Rect};
