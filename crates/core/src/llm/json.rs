use crate::domain::contract::LlmLoanExtraction;
use anyhow::Context;

/// Returns the JSON payload of a model reply.
///
/// A reply wrapped in one complete Markdown fence (```json ... ``` or ``` ... ```)
/// is unwrapped. Anything else is passed through as-is, so surrounding prose or an
/// unterminated fence fails to parse.
pub fn unwrap_fenced(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some((info, body)) = rest.split_once('\n') else {
        return trimmed;
    };
    let info = info.trim();
    if !(info.is_empty() || info.eq_ignore_ascii_case("json")) {
        return trimmed;
    }
    match body.trim_end().strip_suffix("```") {
        Some(inner) if !inner.contains("```") => inner.trim(),
        _ => trimmed,
    }
}

/// Decodes model text into the raw extraction. The whole reply must be one
/// JSON object; a missing required key is an error here.
pub fn parse_extraction(text: &str) -> anyhow::Result<LlmLoanExtraction> {
    let json_str = unwrap_fenced(text);
    serde_json::from_str::<LlmLoanExtraction>(json_str)
        .with_context(|| format!("LLM output is not valid JSON for loan schema: {json_str}"))
}
