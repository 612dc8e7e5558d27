//! PDF metadata extraction

use std::path::Path;
use lopdf::{Document, Object};
use crate::error::{Error, Result};
use crate::margin::PageRect;
use crate::pdf::boxes::require_page_rects;

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Page boundary rectangles in document order
    pub pages: Vec<PageRect>,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

impl PdfMetadata {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Read a text entry from the document Info dictionary
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => *id,
        _ => return None,
    };
    let info = doc.get_dictionary(info_id).ok()?;
    let bytes = info.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Extract metadata from a loaded document
pub fn document_metadata(doc: &Document) -> Result<PdfMetadata> {
    let pages = require_page_rects(doc)?;
    if pages.is_empty() {
        return Err(Error::EmptyPdf);
    }

    Ok(PdfMetadata {
        pages,
        title: info_string(doc, b"Title"),
        author: info_string(doc, b"Author"),
    })
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    document_metadata(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::create_test_pdf;
    use lopdf::{Dictionary, StringFormat};

    #[test]
    fn test_extract_metadata_nonexistent_file() {
        let result = extract_metadata(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_document_metadata_reads_info() {
        let mut doc = Document::load_mem(&create_test_pdf(2)).unwrap();
        let info_id = doc.add_object(Dictionary::from_iter(vec![(
            "Title",
            Object::String(b"Handout".to_vec(), StringFormat::Literal),
        )]));
        doc.trailer.set("Info", Object::Reference(info_id));

        let metadata = document_metadata(&doc).unwrap();
        assert_eq!(metadata.page_count(), 2);
        assert_eq!(metadata.title.as_deref(), Some("Handout"));
        assert_eq!(metadata.author, None);
        assert_eq!(metadata.pages[0], PageRect::new(0.0, 0.0, 612.0, 792.0));
    }
}
