//! Scratch storage for intermediate documents
//!
//! Every transform writes its result to a fresh file inside a per-session
//! temporary directory. Files are unlinked when the last handle referring
//! to them is dropped, and the directory goes away with the session.

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use lopdf::Document;
use tempfile::{Builder, TempDir, TempPath};
use tracing::{debug, info};
use crate::error::{Error, Result};
use crate::pdf::io::save_document;

/// Options controlling where and how intermediate files are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrunchOptions {
    /// Prefix of the session's temporary directory
    pub temp_prefix: String,
    /// Parent of the temporary directory (system temp dir when `None`)
    pub temp_root: Option<PathBuf>,
    /// Compress streams before every save
    pub compress: bool,
    /// PDF version written into documents assembled by `join` and `write`
    pub pdf_version: String,
}

impl Default for CrunchOptions {
    fn default() -> Self {
        Self {
            temp_prefix: "pdfcrunch".to_string(),
            temp_root: None,
            compress: true,
            pdf_version: "1.5".to_string(),
        }
    }
}

/// The file a handle reads its pages from
#[derive(Debug)]
pub(crate) enum Backing {
    /// The caller's own file; never modified or deleted
    Source(PathBuf),
    /// A file written by a transform; deleted when `temp` is released or dropped
    Scratch {
        path: PathBuf,
        temp: RefCell<Option<TempPath>>,
    },
}

impl Backing {
    pub(crate) fn path(&self) -> &Path {
        match self {
            Backing::Source(path) => path,
            Backing::Scratch { path, .. } => path,
        }
    }

    /// Fail unless the backing file can still be read
    pub(crate) fn check_live(&self) -> Result<()> {
        match self {
            Backing::Source(path) => {
                if path.is_file() {
                    Ok(())
                } else {
                    Err(Error::FileNotFound(path.clone()))
                }
            }
            Backing::Scratch { path, temp } => {
                if temp.borrow().is_some() && path.is_file() {
                    Ok(())
                } else {
                    Err(Error::StaleHandle(path.clone()))
                }
            }
        }
    }

    /// Delete a scratch file now instead of waiting for the last handle to drop
    pub(crate) fn release(&self) -> Result<()> {
        if let Backing::Scratch { path, temp } = self {
            if let Some(temp) = temp.borrow_mut().take() {
                match temp.close() {
                    Ok(()) => debug!(path = %path.display(), "released scratch file"),
                    // Already gone with its session directory
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }
}

/// A temporary directory shared by a root handle and everything derived from it
#[derive(Debug)]
pub(crate) struct Scratch {
    dir: RefCell<Option<TempDir>>,
    path: PathBuf,
    options: CrunchOptions,
}

impl Scratch {
    pub(crate) fn create(options: CrunchOptions) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(&options.temp_prefix);

        let dir = match &options.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();

        debug!(path = %path.display(), "created scratch directory");

        Ok(Self {
            dir: RefCell::new(Some(dir)),
            path,
            options,
        })
    }

    pub(crate) fn options(&self) -> &CrunchOptions {
        &self.options
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_open(&self) -> bool {
        self.dir.borrow().is_some()
    }

    /// Write `doc` to a new uniquely named file in the session directory
    pub(crate) fn materialize(&self, doc: &mut Document) -> Result<Backing> {
        let dir = self.dir.borrow();
        let dir = dir
            .as_ref()
            .ok_or_else(|| Error::StaleHandle(self.path.clone()))?;

        let mut file = Builder::new()
            .prefix("crunch-")
            .suffix(".pdf")
            .tempfile_in(dir.path())?;
        save_document(doc, file.as_file_mut(), self.options.compress)?;

        let temp = file.into_temp_path();
        let path = temp.to_path_buf();

        debug!(path = %path.display(), pages = doc.get_pages().len(), "materialized document");

        Ok(Backing::Scratch {
            path,
            temp: RefCell::new(Some(temp)),
        })
    }

    /// Remove the session directory and every scratch file in it
    ///
    /// Idempotent; later materializations fail with `StaleHandle`.
    pub(crate) fn close(&self) -> Result<()> {
        if let Some(dir) = self.dir.borrow_mut().take() {
            dir.close()?;
            info!(path = %self.path.display(), "closed scratch directory");
        }
        Ok(())
    }
}
