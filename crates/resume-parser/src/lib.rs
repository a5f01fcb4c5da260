//! resume-parser: structured field extraction from PDF and DOCX resumes
//!
//! Uploaded resumes are converted to plain text, sent to a local chat model
//! with an extraction prompt, and the JSON reply is validated and normalized.
//! Parsed resumes are optionally stored in SQLite, deduplicated by content hash.

pub mod config;
pub mod error;
pub mod extract;
pub mod parser;
pub mod prompt;
pub mod server;
pub mod storage;
pub mod types;
pub mod validate;

pub use config::ResumeParserConfig;
pub use error::{Error, Result};
pub use parser::ResumeParser;
pub use storage::{ResumeDb, SaveOutcome, StoredResume};
pub use types::ParsedResume;
