//! Error types for the PDF margins library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF margins library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// User store error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Margin list that is not exactly four integers
    #[error("Invalid margins '{0}': expected four comma-separated integers")]
    InvalidMargins(String),

    /// Selected page list with a non-numeric entry
    #[error("Invalid page list '{0}': expected comma-separated page numbers")]
    InvalidPageList(String),

    /// Group token not shaped like `start-end:l,t,r,b`
    #[error("Invalid group '{0}': expected start-end:left,top,right,bottom")]
    InvalidGroup(String),

    /// Unknown policy mode
    #[error("Invalid mode '{0}': expected all, odd_even, selected or groups")]
    InvalidMode(String),

    /// Page without a usable boundary rectangle
    #[error("Page {page} has no valid MediaBox")]
    InvalidBox { page: u32 },

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages")]
    EmptyPdf,

    /// Unknown user or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// User already holds an active session
    #[error("User '{0}' is already logged in")]
    AlreadyLoggedIn(String),

    /// Token does not belong to any user
    #[error("Unknown session token")]
    UnknownSession,

    /// Username taken
    #[error("User '{0}' already exists")]
    UserExists(String),

    /// Bad configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error comes from malformed policy input rather than the document
    pub fn is_policy_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidMargins(_)
                | Error::InvalidPageList(_)
                | Error::InvalidGroup(_)
                | Error::InvalidMode(_)
        )
    }
}
