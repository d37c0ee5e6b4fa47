//! The chainable document handle
//!
//! A [`Cruncher`] is an immutable view of some pages of a PDF file. Slicing
//! only narrows the page range. Every transform loads the backing file
//! fresh, edits the loaded copy, writes it to a new scratch file and returns
//! a handle over that file, so no lopdf document is ever reused between
//! operations.
//!
//! # Example
//!
//! ```no_run
//! use pdf_crunch::{Bounds, Cruncher};
//!
//! Cruncher::scoped("report.pdf", |doc| {
//!     doc.slice(-5..)?
//!         .crop_to(Bounds::new().xmax(500.0).ymin(800.0))?
//!         .rotate90cw(1)?
//!         .write("out.pdf")?;
//!     Ok(())
//! })
//! .expect("Failed to crunch PDF");
//! ```

use std::fs;
use std::path::Path;
use std::rc::Rc;
use lopdf::{Document, ObjectId};
use tracing::{debug, info, warn};
use crate::error::{Error, Result};
use crate::pdf::io::{load_scratch, load_source, save_document};
use crate::pdf::merge::{assemble, PageSelection};
use crate::pdf::metadata::{extract_metadata, PdfMetadata};
use crate::pdf::page::{self, Bounds, PageInfo};
use crate::range::{PageRange, Slice};
use crate::scratch::{Backing, CrunchOptions, Scratch};
use crate::verify::hash_file;

/// Handle over a page range of a PDF file
#[derive(Debug, Clone)]
pub struct Cruncher {
    backing: Rc<Backing>,
    pages: PageRange,
    /// Pages in the backing document
    page_count: usize,
    scratch: Rc<Scratch>,
}

/// Closes a session when a scope ends, including by panic
struct SessionGuard {
    scratch: Rc<Scratch>,
}

impl SessionGuard {
    fn finish(self) -> Result<()> {
        self.scratch.close()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self.scratch.close() {
            warn!(path = %self.scratch.path().display(), error = %e, "failed to remove scratch directory");
        }
    }
}

fn check_factor(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidValue(format!("{} must be a positive number, got {}", name, value)))
    }
}

impl Cruncher {
    /// Open a PDF with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, CrunchOptions::default())
    }

    /// Open a PDF, starting a new scratch session
    ///
    /// Fails with `FileNotFound`, `Format` or `EmptyPdf` when the file can't
    /// serve as a source.
    pub fn open_with<P: AsRef<Path>>(path: P, options: CrunchOptions) -> Result<Self> {
        let path = path.as_ref();
        let page_count = load_source(path)?.get_pages().len();
        let scratch = Scratch::create(options)?;

        Ok(Self {
            backing: Rc::new(Backing::Source(path.to_path_buf())),
            pages: PageRange::all(page_count),
            page_count,
            scratch: Rc::new(scratch),
        })
    }

    /// Open a PDF, run `f`, then remove every scratch file of the session
    ///
    /// Cleanup happens whether `f` succeeds, fails or panics. Handles that
    /// escape `f` are stale afterwards; write results out inside `f`.
    pub fn scoped<P, T, F>(path: P, f: F) -> Result<T>
    where
        P: AsRef<Path>,
        F: FnOnce(&Cruncher) -> Result<T>,
    {
        Self::scoped_with(path, CrunchOptions::default(), f)
    }

    /// [`Cruncher::scoped`] with explicit options
    pub fn scoped_with<P, T, F>(path: P, options: CrunchOptions, f: F) -> Result<T>
    where
        P: AsRef<Path>,
        F: FnOnce(&Cruncher) -> Result<T>,
    {
        let root = Self::open_with(path, options)?;
        let guard = SessionGuard {
            scratch: Rc::clone(&root.scratch),
        };

        let result = f(&root);
        let closed = guard.finish();

        let value = result?;
        closed?;
        Ok(value)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        self.backing.path()
    }

    /// Number of pages this handle covers
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 1-based page numbers in the backing file, in handle order
    pub fn page_numbers(&self) -> Vec<usize> {
        self.pages.iter().map(|i| i + 1).collect()
    }

    /// True once the backing file or the session has been cleaned up
    ///
    /// Transforms on a stale handle fail with `StaleHandle`. A handle over
    /// the caller's own file can still be written out after its session is
    /// closed, since that only reads the source.
    pub fn is_stale(&self) -> bool {
        !self.scratch.is_open() || self.backing.check_live().is_err()
    }

    /// Narrow the page range; no I/O
    ///
    /// Negative bounds count from the end and out-of-range bounds are
    /// clamped. An empty result is a `Range` error.
    pub fn slice<S: Into<Slice>>(&self, range: S) -> Result<Cruncher> {
        let pages = self.pages.slice(&range.into())?;
        Ok(Self { pages, ..self.clone() })
    }

    /// A single page; negative indices count from the end
    pub fn page(&self, index: isize) -> Result<Cruncher> {
        let page = self.pages.index(index)?;
        Ok(Self {
            pages: PageRange::single(page),
            ..self.clone()
        })
    }

    /// One single-page handle per page, in order
    pub fn split(&self) -> Vec<Cruncher> {
        self.pages
            .iter()
            .map(|page| Self {
                pages: PageRange::single(page),
                ..self.clone()
            })
            .collect()
    }

    /// Crop every page in range to `bounds` (user units)
    pub fn crop_to(&self, bounds: Bounds) -> Result<Cruncher> {
        bounds.check()?;
        self.transform("crop_to", |doc, page_id| {
            page::crop_page(doc, page_id, &bounds).map(|_| ())
        })
    }

    /// Crop every page in range to a fraction of itself
    ///
    /// `Bounds::new().xmax(0.5).ymin(0.5)` keeps the top-left quarter.
    pub fn crop_by(&self, fractions: Bounds) -> Result<Cruncher> {
        fractions.check()?;
        self.transform("crop_by", |doc, page_id| {
            page::crop_page_by(doc, page_id, &fractions).map(|_| ())
        })
    }

    /// Scale every page in range uniformly
    pub fn scale_by(&self, factor: f32) -> Result<Cruncher> {
        check_factor("scale factor", factor)?;
        self.scale_xy(factor, factor)
    }

    /// Scale every page in range by separate horizontal and vertical factors
    pub fn scale_xy(&self, sx: f32, sy: f32) -> Result<Cruncher> {
        check_factor("horizontal scale factor", sx)?;
        check_factor("vertical scale factor", sy)?;
        self.transform("scale", |doc, page_id| page::scale_page(doc, page_id, sx, sy))
    }

    /// Scale every page in range to the given size in user units
    ///
    /// A missing dimension keeps each page's aspect ratio.
    pub fn scale_to(&self, width: Option<f32>, height: Option<f32>) -> Result<Cruncher> {
        if let Some(width) = width {
            check_factor("target width", width)?;
        }
        if let Some(height) = height {
            check_factor("target height", height)?;
        }
        self.transform("scale_to", |doc, page_id| {
            page::scale_page_to(doc, page_id, width, height)
        })
    }

    /// Rotate every page in range clockwise by `times` quarter turns
    ///
    /// Negative values rotate counter-clockwise.
    pub fn rotate90cw(&self, times: i32) -> Result<Cruncher> {
        let degrees = 90 * i64::from(times.rem_euclid(4));
        self.transform("rotate90cw", |doc, page_id| {
            page::rotate_page(doc, page_id, degrees).map(|_| ())
        })
    }

    /// Concatenate this handle's pages with each of `others`, in order
    ///
    /// The result belongs to this handle's session.
    pub fn join(&self, others: &[&Cruncher]) -> Result<Cruncher> {
        let mut selections = Vec::with_capacity(others.len() + 1);
        for handle in std::iter::once(self).chain(others.iter().copied()) {
            selections.push(handle.selection()?);
        }

        let mut joined = assemble(selections, &self.scratch.options().pdf_version)?;
        let page_count = joined.get_pages().len();
        let backing = self.scratch.materialize(&mut joined)?;

        debug!(
            inputs = others.len() + 1,
            pages = page_count,
            path = %backing.path().display(),
            "joined documents"
        );

        Ok(Self {
            backing: Rc::new(backing),
            pages: PageRange::all(page_count),
            page_count,
            scratch: Rc::clone(&self.scratch),
        })
    }

    /// Write this handle's pages to `path`, replacing any existing file
    ///
    /// Parent directories are created as needed.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<&Self> {
        let path = path.as_ref();
        self.backing.check_live()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if self.pages.covers_all(self.page_count) {
            if !is_same_file(self.path(), path) {
                fs::copy(self.path(), path)?;
            }
        } else {
            let mut extracted = assemble(vec![self.selection()?], &self.scratch.options().pdf_version)?;
            save_document(&mut extracted, fs::File::create(path)?, self.scratch.options().compress)?;
        }

        info!(path = %path.display(), pages = self.page_count(), "wrote PDF");
        Ok(self)
    }

    /// Release this handle's resources now
    ///
    /// On a handle opened from a file this removes the whole session
    /// directory, making every derived handle stale. On a derived handle it
    /// deletes that handle's own scratch file (shared with its slices).
    pub fn close(&self) -> Result<()> {
        match &*self.backing {
            Backing::Source(_) => self.scratch.close(),
            Backing::Scratch { .. } => self.backing.release(),
        }
    }

    /// Geometry of every page in range
    pub fn page_info(&self) -> Result<Vec<PageInfo>> {
        let doc = self.load()?;
        self.page_ids(&doc)?
            .into_iter()
            .enumerate()
            .map(|(i, page_id)| page::page_info(&doc, page_id, i + 1))
            .collect()
    }

    /// Document info of the backing file; `page_count` is this handle's
    pub fn metadata(&self) -> Result<PdfMetadata> {
        let doc = self.load()?;
        Ok(PdfMetadata {
            page_count: self.page_count(),
            ..extract_metadata(&doc)
        })
    }

    /// MD5 digest of the backing file
    pub fn md5(&self) -> Result<String> {
        self.backing.check_live()?;
        hash_file(self.path())
    }

    fn load(&self) -> Result<Document> {
        self.backing.check_live()?;
        match &*self.backing {
            Backing::Source(path) => load_source(path),
            Backing::Scratch { path, .. } => load_scratch(path),
        }
    }

    fn page_ids(&self, doc: &Document) -> Result<Vec<ObjectId>> {
        let numbered = doc.get_pages();
        self.pages
            .iter()
            .map(|i| {
                numbered.get(&(i as u32 + 1)).copied().ok_or_else(|| {
                    Error::Range(format!(
                        "Page {} does not exist in {} (document has {} pages)",
                        i + 1,
                        self.path().display(),
                        numbered.len()
                    ))
                })
            })
            .collect()
    }

    fn selection(&self) -> Result<PageSelection> {
        Ok(PageSelection {
            document: self.load()?,
            pages: self.pages.iter().map(|i| i as u32 + 1).collect(),
        })
    }

    /// Load fresh, edit each page in range, materialize to a new scratch file
    fn transform<F>(&self, operation: &str, mut edit: F) -> Result<Cruncher>
    where
        F: FnMut(&mut Document, ObjectId) -> Result<()>,
    {
        let mut doc = self.load()?;
        for page_id in self.page_ids(&doc)? {
            edit(&mut doc, page_id)?;
        }

        let backing = self.scratch.materialize(&mut doc)?;
        debug!(
            operation,
            pages = self.page_count(),
            source = %self.path().display(),
            path = %backing.path().display(),
            "applied transform"
        );

        Ok(Self {
            backing: Rc::new(backing),
            pages: self.pages,
            page_count: self.page_count,
            scratch: Rc::clone(&self.scratch),
        })
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_factor() {
        assert!(check_factor("f", 1.5).is_ok());
        assert!(matches!(check_factor("f", 0.0), Err(Error::InvalidValue(_))));
        assert!(matches!(check_factor("f", -2.0), Err(Error::InvalidValue(_))));
        assert!(matches!(check_factor("f", f32::NAN), Err(Error::InvalidValue(_))));
        assert!(matches!(check_factor("f", f32::INFINITY), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let result = Cruncher::open("nonexistent.pdf");
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    // Behaviour against real files lives in tests/
}
