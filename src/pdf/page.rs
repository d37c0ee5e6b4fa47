//! Per-page primitives using lopdf
//!
//! Everything here edits a single page object of a loaded [`Document`] in
//! place. Callers are expected to load a fresh document for every operation
//! and save the result elsewhere; nothing in this module touches the disk.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use crate::error::{Error, Result};

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Boundary boxes that are rescaled together with the page content
const PAGE_BOXES: [&[u8]; 5] = [b"MediaBox", b"CropBox", b"BleedBox", b"TrimBox", b"ArtBox"];

/// Upper bound on Parent hops, in case a malformed file has a cycle
const MAX_TREE_DEPTH: usize = 64;

/// A page rectangle in user units, normalized so `x0 <= x1` and `y0 <= y1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Build a rectangle from two opposite corners given in any order
    pub fn new(xa: f32, ya: f32, xb: f32, yb: f32) -> Self {
        Self {
            x0: xa.min(xb),
            y0: ya.min(yb),
            x1: xa.max(xb),
            y1: ya.max(yb),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// True when the rectangle encloses no area
    pub fn is_degenerate(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Overlap of two rectangles (degenerate when they don't overlap)
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// Scale about the origin, as a `sx 0 0 sy 0 0 cm` would
    pub fn scale(&self, sx: f32, sy: f32) -> Rect {
        Rect::new(self.x0 * sx, self.y0 * sy, self.x1 * sx, self.y1 * sy)
    }

    fn to_object(self) -> Object {
        Object::Array(vec![
            Object::Real(self.x0),
            Object::Real(self.y0),
            Object::Real(self.x1),
            Object::Real(self.y1),
        ])
    }

    fn from_object(doc: &Document, object: &Object) -> Result<Rect> {
        let (_, object) = doc.dereference(object)?;
        let values = object.as_array()?;

        if values.len() != 4 {
            return Err(Error::General(format!(
                "Expected 4 numbers in page box, found {}",
                values.len()
            )));
        }

        let mut coords = [0.0f32; 4];
        for (slot, value) in coords.iter_mut().zip(values) {
            let (_, value) = doc.dereference(value)?;
            *slot = value.as_float()?;
        }

        Ok(Rect::new(coords[0], coords[1], coords[2], coords[3]))
    }
}

/// Crop bounds; any side left as `None` keeps the page's current edge
///
/// # Example
///
/// ```
/// use pdf_crunch::Bounds;
///
/// let bounds = Bounds::new().xmax(500.0).ymin(800.0);
/// assert_eq!(bounds.xmin, None);
/// assert_eq!(bounds.xmax, Some(500.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub xmin: Option<f32>,
    pub ymin: Option<f32>,
    pub xmax: Option<f32>,
    pub ymax: Option<f32>,
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn xmin(mut self, value: f32) -> Self {
        self.xmin = Some(value);
        self
    }

    pub fn ymin(mut self, value: f32) -> Self {
        self.ymin = Some(value);
        self
    }

    pub fn xmax(mut self, value: f32) -> Self {
        self.xmax = Some(value);
        self
    }

    pub fn ymax(mut self, value: f32) -> Self {
        self.ymax = Some(value);
        self
    }

    /// Reject bounds that are degenerate before looking at any page
    pub fn check(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.xmin, self.xmax) {
            if min >= max {
                return Err(Error::Range(format!("xmin {} must be less than xmax {}", min, max)));
            }
        }
        if let (Some(min), Some(max)) = (self.ymin, self.ymax) {
            if min >= max {
                return Err(Error::Range(format!("ymin {} must be less than ymax {}", min, max)));
            }
        }
        Ok(())
    }

    /// Fill in missing sides from `page`; the result is not reordered
    fn resolve(&self, page: &Rect) -> Rect {
        Rect {
            x0: self.xmin.unwrap_or(page.x0),
            y0: self.ymin.unwrap_or(page.y0),
            x1: self.xmax.unwrap_or(page.x1),
            y1: self.ymax.unwrap_or(page.y1),
        }
    }

    /// Read each side as a fraction (0..=1) of `page` and return absolute bounds
    fn fractions_of(&self, page: &Rect) -> Bounds {
        let x = |f: f32| page.x0 + page.width() * f.clamp(0.0, 1.0);
        let y = |f: f32| page.y0 + page.height() * f.clamp(0.0, 1.0);

        Bounds {
            xmin: Some(x(self.xmin.unwrap_or(0.0))),
            ymin: Some(y(self.ymin.unwrap_or(0.0))),
            xmax: Some(x(self.xmax.unwrap_or(1.0))),
            ymax: Some(y(self.ymax.unwrap_or(1.0))),
        }
    }
}

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    /// Identity matrix (no transformation)
    pub const IDENTITY: Matrix = Matrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    /// `self` followed by `other`, i.e. the CTM after `self` is concatenated onto `other`
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn from_operands(operands: &[Object]) -> Result<Matrix> {
        if operands.len() != 6 {
            return Err(Error::General(format!(
                "cm operator takes 6 operands, found {}",
                operands.len()
            )));
        }

        let mut v = [0.0f32; 6];
        for (slot, operand) in v.iter_mut().zip(operands) {
            *slot = operand.as_float()?;
        }

        Ok(Matrix { a: v[0], b: v[1], c: v[2], d: v[3], e: v[4], f: v[5] })
    }
}

/// Geometry of one page as seen by a viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// 1-based position within the handle it was read from
    pub number: usize,
    pub media_box: Rect,
    /// Visible region; equals the media box when the page has no CropBox
    pub crop_box: Rect,
    /// Clockwise rotation in degrees: 0, 90, 180 or 270
    pub rotation: i64,
    /// Transformation in effect when the page starts painting
    pub transform: Matrix,
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    Ok(doc.get_object_mut(page_id)?.as_dict_mut()?)
}

/// Look up a page attribute, walking up the page tree if the page itself lacks it
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
    let mut current = doc.get_dictionary(page_id)?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Ok(Some(value.clone()));
        }

        match current.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = doc.get_dictionary(*parent_id)?,
            _ => return Ok(None),
        }
    }

    Ok(None)
}

/// Copy inherited attributes onto the page itself
///
/// Needed before a page is moved to a different parent, and before its
/// boxes are rewritten so the edit doesn't leak into sibling pages.
pub fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut missing = Vec::new();

    for key in INHERITABLE_KEYS {
        if doc.get_dictionary(page_id)?.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(doc, page_id, key)? {
            missing.push((key, value));
        }
    }

    let page = page_dict_mut(doc, page_id)?;
    for (key, value) in missing {
        page.set(key.to_vec(), value);
    }

    Ok(())
}

/// The page's MediaBox, inherited if necessary
pub fn media_box(doc: &Document, page_id: ObjectId) -> Result<Rect> {
    match inherited_attribute(doc, page_id, b"MediaBox")? {
        Some(object) => Rect::from_object(doc, &object),
        None => Err(Error::General(format!("Page {:?} has no MediaBox", page_id))),
    }
}

/// The page's visible region: its CropBox, or the MediaBox when absent
pub fn crop_box(doc: &Document, page_id: ObjectId) -> Result<Rect> {
    match inherited_attribute(doc, page_id, b"CropBox")? {
        Some(object) => Rect::from_object(doc, &object),
        None => media_box(doc, page_id),
    }
}

/// A box set directly on the page dictionary (no inheritance)
fn own_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Rect>> {
    match doc.get_dictionary(page_id)?.get(key) {
        Ok(object) => Ok(Some(Rect::from_object(doc, object)?)),
        Err(_) => Ok(None),
    }
}

/// Clockwise page rotation normalized to 0, 90, 180 or 270
pub fn rotation(doc: &Document, page_id: ObjectId) -> Result<i64> {
    match inherited_attribute(doc, page_id, b"Rotate")? {
        Some(object) => {
            let (_, object) = doc.dereference(&object)?;
            Ok(object.as_i64()?.rem_euclid(360))
        }
        None => Ok(0),
    }
}

/// Add `degrees` of clockwise rotation to a page; returns the new rotation
pub fn rotate_page(doc: &mut Document, page_id: ObjectId, degrees: i64) -> Result<i64> {
    let rotation = (rotation(doc, page_id)? + degrees).rem_euclid(360);
    page_dict_mut(doc, page_id)?.set("Rotate", Object::Integer(rotation));
    Ok(rotation)
}

/// Shrink the page's visible area to `bounds` (in user units)
///
/// The requested rectangle is intersected with the current MediaBox and
/// becomes the new MediaBox and CropBox. An existing TrimBox is clipped too.
pub fn crop_page(doc: &mut Document, page_id: ObjectId, bounds: &Bounds) -> Result<Rect> {
    flatten_inherited(doc, page_id)?;

    let media = media_box(doc, page_id)?;
    let requested = bounds.resolve(&media);
    if requested.is_degenerate() {
        return Err(Error::Range(format!("Crop rectangle {:?} is degenerate", requested)));
    }

    let target = requested.intersect(&media);
    if target.is_degenerate() {
        return Err(Error::Range(format!(
            "Crop rectangle {:?} does not overlap page box {:?}",
            requested, media
        )));
    }

    let clip = |rect: Rect| {
        let clipped = rect.intersect(&target);
        if clipped.is_degenerate() { target } else { clipped }
    };

    let crop = clip(crop_box(doc, page_id)?);
    let trim = own_box(doc, page_id, b"TrimBox")?.map(clip);

    let page = page_dict_mut(doc, page_id)?;
    page.set("MediaBox", target.to_object());
    page.set("CropBox", crop.to_object());
    if let Some(trim) = trim {
        page.set("TrimBox", trim.to_object());
    }

    Ok(target)
}

/// Crop to a fraction of the page: `Bounds::new().xmax(0.5).ymin(0.5)` keeps the top-left quarter
pub fn crop_page_by(doc: &mut Document, page_id: ObjectId, fractions: &Bounds) -> Result<Rect> {
    let media = media_box(doc, page_id)?;
    crop_page(doc, page_id, &fractions.fractions_of(&media))
}

/// Scale a page's content and boxes by `sx` horizontally and `sy` vertically
pub fn scale_page(doc: &mut Document, page_id: ObjectId, sx: f32, sy: f32) -> Result<()> {
    flatten_inherited(doc, page_id)?;

    let mut scaled = Vec::new();
    for key in PAGE_BOXES {
        if let Some(rect) = own_box(doc, page_id, key)? {
            scaled.push((key, rect.scale(sx, sy)));
        }
    }

    let cm = Operation::new(
        "cm",
        vec![
            Object::Real(sx),
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(sy),
            Object::Integer(0),
            Object::Integer(0),
        ],
    );
    wrap_page_content(doc, page_id, vec![cm])?;

    let page = page_dict_mut(doc, page_id)?;
    for (key, rect) in scaled {
        page.set(key.to_vec(), rect.to_object());
    }

    Ok(())
}

/// Scale a page so its MediaBox measures `width` x `height`
///
/// A missing dimension keeps the aspect ratio; both missing leaves the page alone.
pub fn scale_page_to(
    doc: &mut Document,
    page_id: ObjectId,
    width: Option<f32>,
    height: Option<f32>,
) -> Result<()> {
    let media = media_box(doc, page_id)?;
    if media.is_degenerate() {
        return Err(Error::General(format!("Page {:?} has an empty MediaBox", page_id)));
    }

    let (sx, sy) = match (width, height) {
        (None, None) => return Ok(()),
        (Some(w), None) => {
            let s = w / media.width();
            (s, s)
        }
        (None, Some(h)) => {
            let s = h / media.height();
            (s, s)
        }
        (Some(w), Some(h)) => (w / media.width(), h / media.height()),
    };

    scale_page(doc, page_id, sx, sy)
}

/// Wrap the page's content streams in `q <prelude> ... Q`
///
/// The prelude and the closing `Q` go into their own small streams so the
/// original (possibly compressed) streams are referenced untouched.
fn wrap_page_content(doc: &mut Document, page_id: ObjectId, prelude: Vec<Operation>) -> Result<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(contents) => match doc.dereference(contents)? {
            (_, Object::Array(items)) => items.clone(),
            (_, Object::Stream(_)) => vec![contents.clone()],
            _ => Vec::new(),
        },
        Err(_) => Vec::new(),
    };

    let mut operations = vec![Operation::new("q", vec![])];
    operations.extend(prelude);
    let open = Content { operations }.encode()?;
    let close = Content { operations: vec![Operation::new("Q", vec![])] }.encode()?;

    let open_id = doc.add_object(Stream::new(Dictionary::new(), open));
    let close_id = doc.add_object(Stream::new(Dictionary::new(), close));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

/// Detect the transformation in effect when the page first paints something
///
/// Follows `q`/`Q`/`cm` at the head of the content stream and stops at the
/// first other operator.
pub fn initial_transform(doc: &Document, page_id: ObjectId) -> Result<Matrix> {
    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut saved = Vec::new();
    let mut ctm = Matrix::IDENTITY;

    for operation in &content.operations {
        match operation.operator.as_str() {
            "q" => saved.push(ctm),
            "Q" => ctm = saved.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => ctm = Matrix::from_operands(&operation.operands)?.multiply(&ctm),
            _ => break,
        }
    }

    Ok(ctm)
}

/// Collect the geometry of one page
pub fn page_info(doc: &Document, page_id: ObjectId, number: usize) -> Result<PageInfo> {
    Ok(PageInfo {
        number,
        media_box: media_box(doc, page_id)?,
        crop_box: crop_box(doc, page_id)?,
        rotation: rotation(doc, page_id)?,
        transform: initial_transform(doc, page_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{sample_document, sample_document_with_inherited_boxes};

    fn first_page(doc: &Document) -> ObjectId {
        doc.get_pages()[&1]
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let rect = Rect::new(100.0, 50.0, 0.0, 0.0);
        assert_eq!(rect, Rect { x0: 0.0, y0: 0.0, x1: 100.0, y1: 50.0 });
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 50.0);
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 150.0, 150.0);
        assert_eq!(a.intersect(&b), Rect::new(50.0, 50.0, 100.0, 100.0));

        let c = Rect::new(200.0, 200.0, 300.0, 300.0);
        assert!(a.intersect(&c).is_degenerate());
    }

    #[test]
    fn test_bounds_check() {
        assert!(Bounds::new().xmin(10.0).xmax(20.0).check().is_ok());
        assert!(matches!(Bounds::new().xmin(20.0).xmax(20.0).check(), Err(Error::Range(_))));
        assert!(matches!(Bounds::new().ymin(30.0).ymax(10.0).check(), Err(Error::Range(_))));
    }

    #[test]
    fn test_matrix_multiply_scales_compose() {
        let half = Matrix { a: 0.5, d: 0.5, ..Matrix::IDENTITY };
        let triple = Matrix { a: 3.0, d: 3.0, ..Matrix::IDENTITY };
        let both = half.multiply(&triple);
        assert!((both.a - 1.5).abs() < 1e-6);
        assert!((both.d - 1.5).abs() < 1e-6);
        assert_eq!(both.b, 0.0);
    }

    #[test]
    fn test_crop_page_to_bounds() {
        let mut doc = sample_document(&[(612.0, 1008.0)]);
        let page_id = first_page(&doc);

        let target = crop_page(&mut doc, page_id, &Bounds::new().xmax(500.0).ymin(800.0)).unwrap();

        assert_eq!(target, Rect::new(0.0, 800.0, 500.0, 1008.0));
        assert_eq!(media_box(&doc, page_id).unwrap(), target);
        assert_eq!(crop_box(&doc, page_id).unwrap(), target);
    }

    #[test]
    fn test_crop_page_outside_page_fails() {
        let mut doc = sample_document(&[(612.0, 792.0)]);
        let page_id = first_page(&doc);

        let result = crop_page(&mut doc, page_id, &Bounds::new().ymin(800.0));
        assert!(matches!(result, Err(Error::Range(_))));
    }

    #[test]
    fn test_crop_page_by_fraction() {
        let mut doc = sample_document(&[(600.0, 800.0)]);
        let page_id = first_page(&doc);

        let target = crop_page_by(&mut doc, page_id, &Bounds::new().xmax(0.5).ymin(0.5)).unwrap();
        assert_eq!(target, Rect::new(0.0, 400.0, 300.0, 800.0));
    }

    #[test]
    fn test_rotate_page_wraps_around() {
        let mut doc = sample_document(&[(612.0, 792.0)]);
        let page_id = first_page(&doc);

        assert_eq!(rotate_page(&mut doc, page_id, 270).unwrap(), 270);
        assert_eq!(rotate_page(&mut doc, page_id, 180).unwrap(), 90);
        assert_eq!(rotate_page(&mut doc, page_id, -180).unwrap(), 270);
        assert_eq!(rotation(&doc, page_id).unwrap(), 270);
    }

    #[test]
    fn test_scale_page_wraps_content_and_scales_boxes() {
        let mut doc = sample_document(&[(600.0, 800.0)]);
        let page_id = first_page(&doc);

        scale_page(&mut doc, page_id, 0.5, 0.5).unwrap();

        let media = media_box(&doc, page_id).unwrap();
        assert!((media.width() - 300.0).abs() < 1e-3);
        assert!((media.height() - 400.0).abs() < 1e-3);

        let transform = initial_transform(&doc, page_id).unwrap();
        assert!((transform.a - 0.5).abs() < 1e-6);
        assert!((transform.d - 0.5).abs() < 1e-6);

        let contents = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap();
        assert_eq!(contents.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_scale_page_to_width_keeps_aspect() {
        let mut doc = sample_document(&[(600.0, 800.0)]);
        let page_id = first_page(&doc);

        scale_page_to(&mut doc, page_id, Some(300.0), None).unwrap();

        let media = media_box(&doc, page_id).unwrap();
        assert!((media.width() - 300.0).abs() < 1e-3);
        assert!((media.height() - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_inherited_boxes_are_read_and_flattened() {
        let mut doc = sample_document_with_inherited_boxes(2, (400.0, 500.0), 90);
        let page_id = first_page(&doc);

        assert!(!doc.get_dictionary(page_id).unwrap().has(b"MediaBox"));
        assert_eq!(media_box(&doc, page_id).unwrap(), Rect::new(0.0, 0.0, 400.0, 500.0));
        assert_eq!(rotation(&doc, page_id).unwrap(), 90);

        flatten_inherited(&mut doc, page_id).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Rotate"));
    }

    #[test]
    fn test_cropping_one_page_leaves_siblings_alone() {
        let mut doc = sample_document_with_inherited_boxes(2, (400.0, 500.0), 0);
        let pages = doc.get_pages();

        crop_page(&mut doc, pages[&1], &Bounds::new().xmax(100.0)).unwrap();

        assert_eq!(media_box(&doc, pages[&1]).unwrap().width(), 100.0);
        assert_eq!(media_box(&doc, pages[&2]).unwrap().width(), 400.0);
    }
}
