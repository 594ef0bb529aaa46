use crate::error::FileReadError;
use anyhow::Context;
use std::path::Path;

/// Formats the upload screen advertises. Nothing enforces them.
pub const ADVISORY_MIME_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];
pub const ADVISORY_MAX_BYTES: usize = 10 * 1024 * 1024;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Document {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Reads a document from disk. The MIME type is guessed from the extension
    /// unless `mime_type` is given.
    pub async fn read_from_path(
        path: &Path,
        mime_type: Option<&str>,
    ) -> Result<Self, FileReadError> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))
            .map_err(FileReadError::new)?;

        let mime_type = mime_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime_type(path).to_string());

        Ok(Self { bytes, mime_type })
    }

    /// True when the document is outside what the upload screen advertises.
    pub fn exceeds_advisory_limits(&self) -> bool {
        self.bytes.len() > ADVISORY_MAX_BYTES
            || !ADVISORY_MIME_TYPES.contains(&self.mime_type.as_str())
    }
}

pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => FALLBACK_MIME_TYPE,
    }
}
