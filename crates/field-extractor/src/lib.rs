//! # Field extraction
//!
//! Defines the [`FieldExtractor`] trait and an OpenAI-compatible implementation. Extraction is
//! infallible at the trait boundary: any failure yields an empty mapping, which the storage
//! validity gate then discards.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

mod config;
mod openai_extractor;
mod prompt;

pub use config::EnvExtractorConfig;
pub use openai_extractor::{mask_token, OpenAiFieldExtractor};
pub use prompt::{PromptTemplate, DEFAULT_PROMPT_TEMPLATE, MESSAGE_PLACEHOLDER};

/// Extracted field name → JSON value, as returned by the model.
pub type RawFields = Map<String, Value>;

/// Turns raw message text into named fields. Returns an empty map on any failure.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, raw_text: &str) -> RawFields;
}

/// Extractor used when no API key is configured; every call yields an empty map.
#[derive(Debug, Default, Clone)]
pub struct DisabledExtractor;

#[async_trait]
impl FieldExtractor for DisabledExtractor {
    async fn extract(&self, _raw_text: &str) -> RawFields {
        warn!("No language model configured (OPENAI_API_KEY unset); skipping extraction");
        RawFields::new()
    }
}

/// Builds the extractor for `config`: OpenAI when an API key is present, disabled otherwise.
pub fn build_extractor(config: &EnvExtractorConfig) -> anyhow::Result<Arc<dyn FieldExtractor>> {
    match config.api_key.as_deref() {
        Some(api_key) => {
            let template = match config.prompt_file.as_deref() {
                Some(path) => PromptTemplate::from_file(path)?,
                None => PromptTemplate::default(),
            };
            let extractor = OpenAiFieldExtractor::new(api_key.to_string(), config.base_url.clone())
                .with_model(config.model.clone())
                .with_template(template);
            Ok(Arc::new(extractor))
        }
        None => Ok(Arc::new(DisabledExtractor)),
    }
}

/// Parses a model reply into fields.
///
/// Code fences are stripped, then the span from the first `{` to the last `}` is parsed as a
/// JSON object. Prose around the object is ignored.
pub fn parse_fields_response(reply: &str) -> anyhow::Result<RawFields> {
    let text = strip_code_fences(reply.trim());

    let start = text
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("No JSON object found in response"))?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| anyhow::anyhow!("Unterminated JSON object in response"))?;

    let value: Value = serde_json::from_str(&text[start..=end])?;
    match value {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("Expected a JSON object, got {}", other),
    }
}

fn strip_code_fences(text: &str) -> String {
    if text.starts_with("```") {
        text.replace("```json", "").replace("```", "").trim().to_string()
    } else {
        text.to_string()
    }
}
