//! Applying a margin policy to a PDF document

use std::io::Write;
use std::path::Path;

use lopdf::Document;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::margin::MarginPolicy;
use crate::pdf::boxes::{page_rects, write_media_box};

/// Apply a policy to every page of a loaded document
///
/// All rectangles are read before any is written, so the result for one page
/// never depends on another page's update. Only pages the policy rewrites
/// need a readable boundary. Returns the number of pages whose boundary was
/// rewritten.
///
/// # Example
///
/// ```no_run
/// use pdf_margins::margin::{MarginPolicy, MarginQuad};
/// use pdf_margins::pdf::apply_margins;
///
/// let mut doc = lopdf::Document::load("input.pdf").unwrap();
/// let policy = MarginPolicy::Uniform(MarginQuad::uniform(20));
/// apply_margins(&mut doc, &policy).unwrap();
/// doc.save("output.pdf").unwrap();
/// ```
pub fn apply_margins(doc: &mut Document, policy: &MarginPolicy) -> Result<usize> {
    let pages = page_rects(doc);
    if pages.is_empty() {
        return Err(Error::EmptyPdf);
    }

    let mut updates = Vec::new();
    for (page, page_id, rect) in &pages {
        if !policy.selects(*page) {
            continue;
        }
        let rect = rect.ok_or(Error::InvalidBox { page: *page })?;
        if let Some(new_rect) = policy.page_rect(*page, rect) {
            updates.push((*page_id, new_rect));
        }
    }

    for (page_id, rect) in &updates {
        write_media_box(doc, *page_id, rect)?;
    }

    debug!(pages = pages.len(), changed = updates.len(), "margin policy applied");
    Ok(updates.len())
}

/// Apply a policy to an in-memory PDF and return the rewritten bytes
///
/// The input is staged in a uniquely named temporary file for the duration of
/// the call; the file is removed on every return path.
pub fn apply_margins_to_bytes(pdf: &[u8], policy: &MarginPolicy) -> Result<Vec<u8>> {
    let mut staged = tempfile::Builder::new()
        .prefix("pdf-margins-")
        .suffix(".pdf")
        .tempfile()?;
    staged.write_all(pdf)?;
    staged.flush()?;

    let mut doc = Document::load(staged.path())?;
    let changed = apply_margins(&mut doc, policy)?;

    let mut output = Vec::with_capacity(pdf.len());
    doc.save_to(&mut output)?;

    info!(
        input_bytes = pdf.len(),
        output_bytes = output.len(),
        changed,
        "rewrote page margins"
    );
    Ok(output)
}

/// Apply a policy to a PDF file and save the result to `output_path`
pub fn apply_margins_file(
    input_path: &Path,
    output_path: &Path,
    policy: &MarginPolicy,
) -> Result<usize> {
    if !input_path.exists() {
        return Err(Error::FileNotFound(input_path.to_path_buf()));
    }

    let mut doc = Document::load(input_path)?;
    let changed = apply_margins(&mut doc, policy)?;
    doc.save(output_path)?;

    Ok(changed)
}
