//! Error types for the expediente report pipeline.

use std::io;
use thiserror::Error;

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a conversion or the one-time resource setup.
#[derive(Error, Debug)]
pub enum Error {
    /// The payload is not a list of record objects. Raised before any
    /// rendering work; the caller can fix the input and resubmit.
    #[error("{0}")]
    Validation(String),

    /// The layout or PDF engine rejected an instruction (invalid geometry,
    /// malformed style, unusable font data). Fatal for the whole conversion.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Font resources are missing or unreadable. Only raised while building
    /// [`crate::resources::ReportResources`], never per conversion.
    #[error("Font error: {0}")]
    Font(String),

    /// I/O error when reading inputs or writing outputs.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input text is not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors the caller can correct by changing the input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Json(_))
    }
}

impl From<taffy::TaffyError> for Error {
    fn from(err: taffy::TaffyError) -> Self {
        Error::Render(format!("layout engine: {err}"))
    }
}
