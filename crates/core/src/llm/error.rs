use crate::llm::Provider;
use thiserror::Error;

/// Where in a model call things went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    /// The service answered with a non-success status.
    Http,
    /// The response body was not the provider's response envelope.
    Envelope,
    /// The envelope held no usable answer text.
    EmptyResponse,
}

impl CallStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Envelope => "envelope",
            Self::EmptyResponse => "empty_response",
        }
    }
}

/// Internal diagnostics for a failed model call. Logged, never shown to users.
#[derive(Debug, Clone, Error)]
#[error("model call failed (provider={provider:?}, stage={}): {detail}", .stage.as_str())]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: CallStage,
    pub detail: String,
    pub raw_output: Option<String>,
}
