pub mod error;
pub mod gemini;
pub mod json;
pub mod prompt;
pub mod schema;

use crate::document::Document;

/// One extraction call: instruction text, the document, and the required output shape.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub instruction: String,
    pub document: Document,
    pub response_schema: serde_json::Value,
}

impl ExtractionRequest {
    pub fn new(document: Document, today: chrono::NaiveDate) -> Self {
        Self {
            instruction: prompt::instruction(today),
            document,
            response_schema: schema::loan_response_schema(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

#[async_trait::async_trait]
pub trait DocumentModel: Send + Sync {
    fn provider(&self) -> Provider;

    /// Issues a single request and returns the model's raw response text.
    async fn generate(&self, request: &ExtractionRequest) -> anyhow::Result<String>;
}
