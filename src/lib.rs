//! PDF Margins Library
//!
//! Rewrites the page boundaries of PDF documents according to a margin
//! policy, and serves that operation over HTTP. This library provides:
//! - Margin policies (uniform, odd/even, selected pages, page groups)
//! - Reading and writing page boundary rectangles with lopdf
//! - An axum service with upload, login and logout endpoints
//! - A SQLite user store with single-session login
//!
//! # Example
//!
//! ```no_run
//! use pdf_margins::margin::PolicyForm;
//! use pdf_margins::pdf::apply_margins_file;
//! use std::path::Path;
//!
//! let form = PolicyForm {
//!     mode: "odd_even".to_string(),
//!     margins_odd: "40,20,10,20".to_string(),
//!     margins_even: "10,20,40,20".to_string(),
//!     ..Default::default()
//! };
//! let policy = form.to_policy().expect("Invalid policy");
//!
//! apply_margins_file(Path::new("book.pdf"), Path::new("book-bound.pdf"), &policy)
//!     .expect("Failed to apply margins");
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod margin;
pub mod pdf;
pub mod server;

// Re-export commonly used items
pub use error::{Error, Result};
pub use margin::{MarginPolicy, MarginQuad, PageRect};
