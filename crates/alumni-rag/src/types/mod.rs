//! Core types for the alumni RAG service

pub mod conversation;
pub mod query;
pub mod record;
pub mod response;

pub use conversation::{ChatTurn, TurnType};
pub use query::QueryRequest;
pub use record::{AlumniRecord, NewAlumni};
pub use response::{
    AddAlumniResponse, ComponentStatus, ConversationHistoryResponse, HealthResponse,
    MessageResponse, QueryResponse,
};
