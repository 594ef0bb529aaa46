//! Document-to-loan extraction.
//!
//! One call runs a fixed sequence: build the request, make a single remote
//! attempt, parse the text, validate it against the loan contract, then stamp
//! a local id and `Active` status. Any failure along the way collapses into
//! [`ExtractionError`].

use crate::document::{Document, ADVISORY_MAX_BYTES};
use crate::domain::loan::{LoanId, LoanRecord};
use crate::error::ExtractionError;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{json, DocumentModel, ExtractionRequest};
use std::sync::Arc;

#[derive(Clone)]
pub struct LoanExtractor {
    model: Arc<dyn DocumentModel>,
}

impl LoanExtractor {
    pub fn new(model: Arc<dyn DocumentModel>) -> Self {
        Self { model }
    }

    pub async fn extract(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<LoanRecord, ExtractionError> {
        self.extract_document(Document::new(bytes.to_vec(), mime_type))
            .await
    }

    pub async fn extract_document(&self, document: Document) -> Result<LoanRecord, ExtractionError> {
        if document.exceeds_advisory_limits() {
            tracing::warn!(
                mime_type = %document.mime_type,
                bytes = document.bytes.len(),
                advisory_max_bytes = ADVISORY_MAX_BYTES,
                "document is outside the advertised formats or size; sending anyway"
            );
        }

        let today = chrono::Utc::now().date_naive();
        let request = ExtractionRequest::new(document, today);

        match self.run(&request).await {
            Ok(record) => {
                tracing::info!(
                    loan_id = %record.id,
                    lender = %record.lender_name,
                    risk_score = record.risk_score,
                    "loan document analyzed"
                );
                Ok(record)
            }
            Err(err) => {
                let raw_output = err
                    .downcast_ref::<LlmDiagnosticsError>()
                    .and_then(|diag| diag.raw_output.as_deref());
                tracing::error!(
                    provider = ?self.model.provider(),
                    error = %format!("{err:#}"),
                    raw_output,
                    "loan analysis failed"
                );
                Err(ExtractionError::new(err))
            }
        }
    }

    async fn run(&self, request: &ExtractionRequest) -> anyhow::Result<LoanRecord> {
        let text = self.model.generate(request).await?;
        let parsed = json::parse_extraction(&text)?;
        parsed.validate_and_into_record(LoanId::generate())
    }
}
