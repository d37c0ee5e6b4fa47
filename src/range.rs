//! Page range arithmetic
//!
//! Ranges follow Python's `range`/`slice` rules: negative indices count from
//! the end, out-of-range slice bounds are clamped, and steps may be negative.
//! Indices are zero-based positions in the backing document.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};
use crate::error::{Error, Result};

/// A slice request: optional start, stop and step
///
/// Build one from a Rust range (`2..5`, `-5..`, `..3`, `..`) or with
/// [`Slice::new`], and add a step with [`Slice::step_by`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl Slice {
    pub fn new(start: Option<isize>, stop: Option<isize>) -> Self {
        Self { start, stop, step: None }
    }

    /// Same bounds with a different step
    pub fn step_by(self, step: isize) -> Self {
        Self { step: Some(step), ..self }
    }

    /// Resolve against a sequence length, like `slice.indices(len)`
    ///
    /// Returns `(start, stop, step)` with bounds clamped to the sequence.
    fn indices(&self, len: isize) -> Result<(isize, isize, isize)> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(Error::Range("slice step cannot be zero".to_string()));
        }

        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: isize| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };

        let start = self.start.map_or(if step < 0 { upper } else { lower }, clamp);
        let stop = self.stop.map_or(if step < 0 { lower } else { upper }, clamp);
        Ok((start, stop, step))
    }
}

impl From<Range<isize>> for Slice {
    fn from(r: Range<isize>) -> Self {
        Self::new(Some(r.start), Some(r.end))
    }
}

impl From<RangeFrom<isize>> for Slice {
    fn from(r: RangeFrom<isize>) -> Self {
        Self::new(Some(r.start), None)
    }
}

impl From<RangeTo<isize>> for Slice {
    fn from(r: RangeTo<isize>) -> Self {
        Self::new(None, Some(r.end))
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Self::default()
    }
}

/// A resolved, non-lazy arithmetic progression of page indices
///
/// Equivalent to Python's `range(start, stop, step)`; `step` is never zero.
#[derive(Debug, Clone, Copy)]
pub struct PageRange {
    start: isize,
    stop: isize,
    step: isize,
}

impl PageRange {
    /// Every page of a document with `count` pages
    pub fn all(count: usize) -> Self {
        Self { start: 0, stop: count as isize, step: 1 }
    }

    /// A single page
    pub fn single(index: usize) -> Self {
        let index = index as isize;
        Self { start: index, stop: index + 1, step: 1 }
    }

    pub fn len(&self) -> usize {
        let (lo, hi, step) = if self.step > 0 {
            (self.start, self.stop, self.step)
        } else {
            (self.stop, self.start, -self.step)
        };

        if lo >= hi {
            0
        } else {
            ((hi - lo - 1) / step + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the `i`-th page in this range
    pub fn get(&self, i: usize) -> Option<usize> {
        if i < self.len() {
            Some((self.start + i as isize * self.step) as usize)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).map(move |i| (self.start + i as isize * self.step) as usize)
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Resolve a possibly negative position within this range
    pub fn index(&self, position: isize) -> Result<usize> {
        let len = self.len() as isize;
        let resolved = if position < 0 { position + len } else { position };

        usize::try_from(resolved)
            .ok()
            .and_then(|i| self.get(i))
            .ok_or_else(|| {
                Error::Range(format!(
                    "page index {} out of bounds for {} pages",
                    position, len
                ))
            })
    }

    /// Narrow this range with a slice
    ///
    /// Fails if the step is zero or the result selects no pages.
    pub fn slice(&self, slice: &Slice) -> Result<PageRange> {
        let (start, stop, step) = slice.indices(self.len() as isize)?;

        let narrowed = PageRange {
            start: self.start + start * self.step,
            stop: self.start + stop * self.step,
            step: self.step * step,
        };

        if narrowed.is_empty() {
            return Err(Error::Range(format!(
                "slice {:?} selects no pages out of {}",
                slice,
                self.len()
            )));
        }

        Ok(narrowed)
    }

    /// True when the range is exactly `0..count` in order
    pub fn covers_all(&self, count: usize) -> bool {
        self.len() == count && (count == 0 || (self.start == 0 && (count == 1 || self.step == 1)))
    }
}

impl PartialEq for PageRange {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for PageRange {}
