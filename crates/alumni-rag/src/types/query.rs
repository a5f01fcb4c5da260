//! Query request types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum question length in characters
pub const MAX_QUESTION_LEN: usize = 500;

/// Session used when the caller does not supply one
pub const DEFAULT_SESSION: &str = "default";

/// Body of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Natural-language question about alumni
    pub question: String,

    /// Session ID for conversation history
    #[serde(default = "default_session")]
    pub session_id: String,
}

fn default_session() -> String {
    DEFAULT_SESSION.to_string()
}

impl QueryRequest {
    /// Create a query in the default session
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            session_id: default_session(),
        }
    }

    /// Use a specific session
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Check question length and session id
    pub fn validate(&self) -> Result<()> {
        let len = self.question.chars().count();
        if len == 0 || len > MAX_QUESTION_LEN {
            return Err(Error::validation(format!(
                "question must be between 1 and {} characters",
                MAX_QUESTION_LEN
            )));
        }
        if self.session_id.trim().is_empty() {
            return Err(Error::validation("session_id must not be blank"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"question": "Who works at Google?"}"#).unwrap();
        assert_eq!(request.session_id, "default");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_question_length_bounds() {
        assert!(QueryRequest::new("").validate().is_err());
        assert!(QueryRequest::new("a".repeat(500)).validate().is_ok());
        assert!(QueryRequest::new("a".repeat(501)).validate().is_err());
        assert!(QueryRequest::new("hi").with_session("  ").validate().is_err());
    }
}
