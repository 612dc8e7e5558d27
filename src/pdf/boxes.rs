//! Reading and writing page boundary rectangles

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};
use crate::margin::PageRect;

/// Page tree depth after which inheritance lookup gives up (guards against cycles)
const MAX_TREE_DEPTH: usize = 64;

/// Boxes that are dropped when the MediaBox changes; they are not inheritable
const DEPENDENT_BOXES: [&[u8]; 3] = [b"BleedBox", b"TrimBox", b"ArtBox"];

/// Resolve an object, following a single indirect reference
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Convert a box array `[x0 y0 x1 y1]` into a rectangle
fn rect_from_object(doc: &Document, object: &Object) -> Option<PageRect> {
    let Object::Array(values) = resolve(doc, object)? else {
        return None;
    };
    let coords = values
        .iter()
        .map(|v| resolve(doc, v).and_then(number))
        .collect::<Option<Vec<f64>>>()?;

    match coords.as_slice() {
        [x0, y0, x1, y1] => Some(PageRect::new(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}

/// Integral values are written as PDF integers so they survive unrounded
fn coordinate(value: f64) -> Object {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Object::Integer(value as i64)
    } else {
        Object::Real(value as f32)
    }
}

fn rect_to_object(rect: &PageRect) -> Object {
    Object::Array(vec![
        coordinate(rect.x0),
        coordinate(rect.y0),
        coordinate(rect.x1),
        coordinate(rect.y1),
    ])
}

/// Find the page's MediaBox, walking up the page tree for inherited values
pub fn read_media_box(doc: &Document, page_id: ObjectId) -> Option<PageRect> {
    let mut node: &Dictionary = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(media_box) = node.get(b"MediaBox") {
            return rect_from_object(doc, media_box);
        }

        let parent_id = match node.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return None,
        };
        node = doc.get_dictionary(parent_id).ok()?;
    }

    None
}

/// A page's number, object id and boundary rectangle (if it has one)
pub type PageEntry = (u32, ObjectId, Option<PageRect>);

/// Boundary rectangles of every page, in document order
pub fn page_rects(doc: &Document) -> Vec<PageEntry> {
    doc.get_pages()
        .into_iter()
        .map(|(page_number, page_id)| (page_number, page_id, read_media_box(doc, page_id)))
        .collect()
}

/// Boundary rectangles of every page, failing on the first page without one
pub fn require_page_rects(doc: &Document) -> Result<Vec<PageRect>> {
    page_rects(doc)
        .into_iter()
        .map(|(page, _, rect)| rect.ok_or(Error::InvalidBox { page }))
        .collect()
}

/// Replace the page's boundary rectangle
///
/// CropBox is set to the same rectangle so an inherited or smaller crop does
/// not hide the new area; the trim, bleed and art boxes are removed.
pub fn write_media_box(doc: &mut Document, page_id: ObjectId, rect: &PageRect) -> Result<()> {
    let page = doc.get_dictionary_mut(page_id)?;

    page.set("MediaBox", rect_to_object(rect));
    page.set("CropBox", rect_to_object(rect));
    for key in DEPENDENT_BOXES {
        page.remove(key);
    }

    debug!(?page_id, %rect, "page boundary updated");
    Ok(())
}
