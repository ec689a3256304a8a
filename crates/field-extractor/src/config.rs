//! Extractor configuration loaded from the environment.

use std::env;

/// Language-model settings for field extraction.
#[derive(Debug, Clone)]
pub struct EnvExtractorConfig {
    /// OPENAI_API_KEY; extraction is disabled when unset or blank.
    pub api_key: Option<String>,
    /// OPENAI_BASE_URL
    pub base_url: String,
    /// EXTRACTION_MODEL
    pub model: String,
    /// EXTRACTION_PROMPT_FILE, overrides the built-in template.
    pub prompt_file: Option<String>,
}

impl EnvExtractorConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = env::var("EXTRACTION_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let prompt_file = env::var("EXTRACTION_PROMPT_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty());
        Self {
            api_key,
            base_url,
            model,
            prompt_file,
        }
    }
}
