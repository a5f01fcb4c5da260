//! Error types for the resume parser

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for resume parser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Resume parser errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed request
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Model call failed
    #[error("LLM error: {0}")]
    Llm(#[from] alumni_rag::Error),

    /// Model reply could not be turned into a resume
    #[error("Generation error: {0}")]
    Generation(String),

    /// Model call exceeded its time budget
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Resume not found
    #[error("Resume not found: {0}")]
    NotFound(String),

    /// Resume database error
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone()),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Error::UnsupportedFileType(_) => (
                StatusCode::BAD_REQUEST,
                "unsupported_type",
                "Only PDF and DOCX files allowed".to_string(),
            ),
            Error::FileParse { .. } | Error::Llm(_) | Error::Generation(_) | Error::Timeout(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "parse_error",
                format!("Error parsing resume: {}", self),
            ),
            Error::NotFound(email) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Resume not found: {}", email),
            ),
            Error::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg.clone()),
            Error::Sqlite(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                err.to_string(),
            ),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error", err.to_string()),
            Error::Json(err) => (StatusCode::INTERNAL_SERVER_ERROR, "json_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
