//! PDF manipulation module

pub mod apply;
pub mod boxes;
pub mod metadata;

// Re-export commonly used items
pub use apply::{apply_margins, apply_margins_file, apply_margins_to_bytes};
pub use boxes::{page_rects, read_media_box, require_page_rects, write_media_box, PageEntry};
pub use metadata::{document_metadata, extract_metadata, PdfMetadata};
