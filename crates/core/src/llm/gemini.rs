use crate::config::Settings;
use crate::llm::error::{CallStage, LlmDiagnosticsError};
use crate::llm::{DocumentModel, ExtractionRequest, Provider};
use anyhow::Context;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const RESPONSE_MIME_TYPE: &str = "application/json";

/// Client for the `generateContent` endpoint.
///
/// No request timeout is configured and failed calls are not retried; a call
/// runs until the transport resolves it.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url = settings
            .gemini_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .gemini_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self::new(api_key, base_url, model)
    }

    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_body(request: &ExtractionRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.instruction.clone(),
                    },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: request.document.mime_type.clone(),
                            data: general_purpose::STANDARD.encode(&request.document.bytes),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
                response_schema: request.response_schema.clone(),
            },
        }
    }

    async fn generate_content(
        &self,
        body: &GenerateContentRequest,
    ) -> anyhow::Result<GenerateContentResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let res = self
            .http
            .post(self.url())
            .headers(headers)
            .json(body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: CallStage::Http,
                detail: format!("status={status}"),
                raw_output: Some(text),
            }
            .into());
        }

        Self::decode_envelope(text)
    }

    fn decode_envelope(text: String) -> anyhow::Result<GenerateContentResponse> {
        match serde_json::from_str::<GenerateContentResponse>(&text) {
            Ok(res) => Ok(res),
            Err(err) => Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: CallStage::Envelope,
                detail: err.to_string(),
                raw_output: Some(text),
            }
            .into()),
        }
    }

    fn response_text(res: &GenerateContentResponse) -> anyhow::Result<String> {
        let mut out = String::new();
        let parts = res
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default();

        for part in parts {
            if part.thought {
                continue;
            }
            if let Some(text) = &part.text {
                out.push_str(text);
            }
        }

        if out.trim().is_empty() {
            let finish_reason = res
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "none".to_string());
            return Err(LlmDiagnosticsError {
                provider: Provider::Gemini,
                stage: CallStage::EmptyResponse,
                detail: format!("finish_reason={finish_reason}"),
                raw_output: None,
            }
            .into());
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl DocumentModel for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: &ExtractionRequest) -> anyhow::Result<String> {
        let body = Self::build_body(request);
        tracing::debug!(
            model = %self.model,
            mime_type = %request.document.mime_type,
            bytes = request.document.bytes.len(),
            "sending generateContent request"
        );
        let res = self.generate_content(&body).await?;
        Self::response_text(&res)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,

    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,

    // Thinking models may emit reasoning parts ahead of the answer.
    #[serde(default)]
    thought: bool,
}
