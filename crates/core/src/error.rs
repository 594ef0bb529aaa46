//! User-facing failures of the upload flow.
//!
//! Both messages are fixed. The underlying cause is kept as `source()` for
//! logs and never shown to the user.

use thiserror::Error;

pub const FILE_READ_MESSAGE: &str = "Failed to read file.";
pub const EXTRACTION_MESSAGE: &str =
    "Failed to analyze document. Please ensure it is a clear loan agreement.";

/// The input bytes could not be obtained. Raised before any request is made.
#[derive(Debug, Error)]
#[error("{}", FILE_READ_MESSAGE)]
pub struct FileReadError {
    #[source]
    source: anyhow::Error,
}

impl FileReadError {
    pub fn new(source: impl Into<anyhow::Error>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }
}

/// Any failure from request construction through response validation.
#[derive(Debug, Error)]
#[error("{}", EXTRACTION_MESSAGE)]
pub struct ExtractionError {
    #[source]
    source: anyhow::Error,
}

impl ExtractionError {
    pub fn new(source: impl Into<anyhow::Error>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The underlying cause, for diagnostics only.
    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    FileRead(#[from] FileReadError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}
