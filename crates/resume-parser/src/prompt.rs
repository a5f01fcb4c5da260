//! Extraction prompt

use alumni_rag::providers::ChatMessage;
use std::path::Path;

use crate::error::{Error, Result};

/// System message sent ahead of every extraction prompt
pub const SYSTEM_MESSAGE: &str = "You are a resume parser. Return only JSON.";

/// Placeholder replaced with the resume text
pub const RESUME_PLACEHOLDER: &str = "{resume_text}";

/// Built-in extraction template
pub const DEFAULT_TEMPLATE: &str = r#"Extract the following information from the resume below and return it as a single JSON object.

Use exactly these keys:
{
  "name": "full name",
  "email": "email address",
  "phone": "phone number",
  "skills": ["skill", "..."],
  "experience": [{"job_title": "", "company": "", "duration": "", "description": ""}],
  "projects": [{"name": "", "description": "", "technologies": []}],
  "education": [{"degree": "", "institution": "", "year": ""}],
  "courses": ["course or certification"],
  "social_media": {"linkedin": "url", "github": "url", "twitter": "url", "portfolio": "url"}
}

Use null for values that are not present and [] for empty lists.
Return only the JSON object with no explanation.

Resume:
{resume_text}"#;

/// A prompt template with a `{resume_text}` placeholder
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Use a custom template string
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(RESUME_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "Prompt template must contain {}",
                RESUME_PLACEHOLDER
            )));
        }
        Ok(Self { template })
    }

    /// Load from a file, or fall back to the built-in template
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read prompt template {}: {}", path.display(), e))
                })?;
                Self::new(raw)
            }
            None => Ok(Self::default()),
        }
    }

    /// Substitute the resume text
    pub fn render(&self, resume_text: &str) -> String {
        self.template.replace(RESUME_PLACEHOLDER, resume_text)
    }

    /// System and user messages for one resume
    pub fn messages(&self, resume_text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_MESSAGE),
            ChatMessage::user(self.render(resume_text)),
        ]
    }
}
