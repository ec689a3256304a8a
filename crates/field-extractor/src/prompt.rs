//! Extraction prompt template. `{{MESSAGE}}` is replaced with the trimmed message text.

use anyhow::Context;
use std::fs;

pub const MESSAGE_PLACEHOLDER: &str = "{{MESSAGE}}";

pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You read announcements of youth mobility opportunities (exchanges, training courses, volunteering).
Extract the following fields from the message below and answer with a single JSON object only:

{
  "country": "host country",
  "city": "host city",
  "start_date": "first day of the activity",
  "end_date": "last day of the activity",
  "registration_deadline": "last day to apply",
  "topic": "main topic",
  "info_pack": "link to the info pack",
  "form": "link to the application form",
  "contact": "email, phone or person to contact"
}

Use null for anything the message does not state. Do not invent values.

Message:
{{MESSAGE}}
"#;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Reads a template from disk (EXTRACTION_PROMPT_FILE).
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let template = fs::read_to_string(path)
            .with_context(|| format!("Read extraction prompt template {}", path))?;
        if !template.contains(MESSAGE_PLACEHOLDER) {
            anyhow::bail!(
                "Prompt template {} has no {} placeholder",
                path,
                MESSAGE_PLACEHOLDER
            );
        }
        Ok(Self { template })
    }

    pub fn render(&self, message: &str) -> String {
        self.template.replace(MESSAGE_PLACEHOLDER, message.trim())
    }
}
