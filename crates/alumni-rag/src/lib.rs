//! alumni-rag: conversational question answering over an alumni database
//!
//! Alumni records live in a document store. Each record is projected to a flat
//! text document, embedded, and kept in an in-memory vector index that is
//! refreshed when the store changes. Questions are answered by a local chat
//! model grounded on the top retrieved records, with per-session history.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod projection;
pub mod providers;
pub mod server;
pub mod service;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use service::{AlumniRagService, AnswerOutcome, HealthReport, RebuildReport};
pub use types::{AlumniRecord, ChatTurn, NewAlumni, QueryRequest, QueryResponse};
