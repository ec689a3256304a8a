//! OpenAI-compatible FieldExtractor: renders the prompt, asks for a completion, parses the JSON.

use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::prompt::PromptTemplate;
use crate::{parse_fields_response, FieldExtractor, RawFields};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Masks an API key for logging: first 7 chars + "***" + last 4 chars, or "***" when short.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

#[derive(Clone)]
pub struct OpenAiFieldExtractor {
    client: Arc<Client<OpenAIConfig>>,
    masked_key: String,
    model: String,
    template: PromptTemplate,
}

impl OpenAiFieldExtractor {
    pub fn new(api_key: String, base_url: String) -> Self {
        let masked_key = mask_token(&api_key);
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            masked_key,
            model: DEFAULT_MODEL.to_string(),
            template: PromptTemplate::default(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    async fn complete(&self, prompt: String) -> anyhow::Result<String> {
        info!(model = %self.model, api_key = %self.masked_key, "Extraction request");

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .temperature(0.0)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .build()?;

        let response = self.client.chat().create(request).await?;

        if let Some(ref u) = response.usage {
            debug!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                "Extraction usage"
            );
        }

        match response.choices.first() {
            Some(choice) => Ok(choice.message.content.clone().unwrap_or_default()),
            None => anyhow::bail!("No choices in extraction response"),
        }
    }
}

#[async_trait]
impl FieldExtractor for OpenAiFieldExtractor {
    #[instrument(skip(self, raw_text), fields(len = raw_text.len()))]
    async fn extract(&self, raw_text: &str) -> RawFields {
        let reply = match self.complete(self.template.render(raw_text)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Extraction request failed");
                return RawFields::new();
            }
        };

        debug!(reply = %reply.chars().take(300).collect::<String>(), "Raw extraction reply");

        parse_fields_response(&reply).unwrap_or_else(|e| {
            warn!(error = %e, "Could not parse extraction reply");
            RawFields::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("sk-1234567890abcdef"), "sk-1234***cdef");
    }
}
