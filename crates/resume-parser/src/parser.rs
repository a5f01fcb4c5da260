//! Resume parsing pipeline: extract text, prompt the model, validate the reply

use alumni_rag::providers::{GenerationOptions, LlmProvider};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ResumeParserConfig;
use crate::error::{Error, Result};
use crate::extract;
use crate::prompt::PromptTemplate;
use crate::types::ParsedResume;
use crate::validate;

/// Turns uploaded resumes into structured fields
pub struct ResumeParser {
    llm: Arc<dyn LlmProvider>,
    template: PromptTemplate,
    options: GenerationOptions,
    generate_timeout: Duration,
    extract_timeout: Duration,
}

impl ResumeParser {
    pub fn new(llm: Arc<dyn LlmProvider>, template: PromptTemplate, config: &ResumeParserConfig) -> Self {
        Self {
            llm,
            template,
            options: GenerationOptions {
                temperature: Some(config.llm.temperature),
                max_tokens: Some(config.parser.max_tokens),
            },
            generate_timeout: Duration::from_secs(config.llm.timeout_secs),
            extract_timeout: Duration::from_secs(config.parser.extract_timeout_secs),
        }
    }

    /// Model used for extraction
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Parse an uploaded PDF or DOCX
    pub async fn parse(&self, filename: &str, data: Vec<u8>) -> Result<ParsedResume> {
        let text = extract::extract_text(filename, data, self.extract_timeout).await?;
        if text.is_empty() {
            return Err(Error::file_parse(filename, "no text found in document"));
        }
        tracing::info!("Parsing {} ({} chars) with {}", filename, text.len(), self.llm.model());
        self.parse_text(&text).await
    }

    /// Parse already-extracted resume text
    pub async fn parse_text(&self, text: &str) -> Result<ParsedResume> {
        let messages = self.template.messages(text);

        let reply = tokio::time::timeout(self.generate_timeout, self.llm.chat(&messages, &self.options))
            .await
            .map_err(|_| Error::Timeout(self.generate_timeout.as_secs()))??;
        tracing::debug!("Model reply: {} chars", reply.len());

        let object = validate::extract_json_object(&reply)?;
        let mut resume = ParsedResume::from_object(object)
            .map_err(|e| Error::generation(format!("Unexpected resume shape: {}", e)))?;

        resume.skills = validate::normalize_skills(std::mem::take(&mut resume.skills));
        resume.social_media = validate::clean_social_media(std::mem::take(&mut resume.social_media));

        Ok(resume)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alumni_rag::providers::ChatMessage;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Replays a canned reply and records what it was sent
    pub(crate) struct CannedLlm {
        pub reply: String,
        pub delay: Option<Duration>,
        pub seen: Mutex<Vec<(Vec<ChatMessage>, Option<f32>, Option<u32>)>>,
    }

    impl CannedLlm {
        pub(crate) fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                delay: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            options: &GenerationOptions,
        ) -> alumni_rag::Result<String> {
            self.seen
                .lock()
                .push((messages.to_vec(), options.temperature, options.max_tokens));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.reply.clone())
        }

        async fn health_check(&self) -> alumni_rag::Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-model"
        }
    }

    pub(crate) const SAMPLE_REPLY: &str = r#"Here you go:
{
  "name": "John Doe",
  "email": "john@example.com",
  "phone": "+1 555 0100",
  "skills": [" python", "machine learning", "Python", ""],
  "experience": [{"job_title": "Engineer", "company": "Acme", "duration": "2020-2023"}],
  "projects": [],
  "education": [{"degree": "BSc", "institution": "State University", "year": "2019"}],
  "courses": ["Deep Learning"],
  "social_media": {"linkedin": "https://linkedin.com/in/johndoe", "github": "github.com/johndoe"}
}
Hope this helps."#;

    pub(crate) fn parser_with(llm: Arc<CannedLlm>) -> ResumeParser {
        let mut config = ResumeParserConfig::default();
        config.llm.timeout_secs = 1;
        ResumeParser::new(llm, PromptTemplate::default(), &config)
    }

    #[tokio::test]
    async fn test_parse_text_post_processes() {
        let llm = Arc::new(CannedLlm::new(SAMPLE_REPLY));
        let parser = parser_with(Arc::clone(&llm));

        let resume = parser.parse_text("John Doe resume text").await.unwrap();
        assert_eq!(resume.name.as_deref(), Some("John Doe"));
        assert_eq!(resume.skills, vec!["Python", "Machine Learning"]);
        assert_eq!(
            resume.social_media["linkedin"],
            "https://linkedin.com/in/johndoe"
        );
        assert!(resume.social_media["github"].is_null());
        assert_eq!(resume.education.len(), 1);

        let seen = llm.seen.lock();
        let (messages, temperature, max_tokens) = &seen[0];
        assert_eq!(messages[0].content, crate::prompt::SYSTEM_MESSAGE);
        assert!(messages[1].content.contains("John Doe resume text"));
        assert_eq!(*temperature, Some(0.1));
        assert_eq!(*max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn test_reply_without_json() {
        let parser = parser_with(Arc::new(CannedLlm::new("Sorry, I cannot help with that.")));
        let err = parser.parse_text("text").await.unwrap_err();
        assert!(err.to_string().contains("No JSON found in response"));
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let llm = CannedLlm {
            delay: Some(Duration::from_secs(5)),
            ..CannedLlm::new(SAMPLE_REPLY)
        };
        let parser = parser_with(Arc::new(llm));
        assert!(matches!(parser.parse_text("text").await, Err(Error::Timeout(1))));
    }

    #[tokio::test]
    async fn test_unsupported_upload_skips_model() {
        let llm = Arc::new(CannedLlm::new(SAMPLE_REPLY));
        let parser = parser_with(Arc::clone(&llm));

        let err = parser.parse("resume.txt", b"plain".to_vec()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
        assert!(llm.seen.lock().is_empty());
    }
}
