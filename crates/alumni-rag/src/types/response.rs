//! Response bodies for the HTTP facade

use serde::{Deserialize, Serialize};

use super::conversation::ChatTurn;

/// Health of a single dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

impl ComponentStatus {
    pub fn from_bool(healthy: bool) -> Self {
        if healthy {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }

    pub fn is_healthy(self) -> bool {
        self == Self::Healthy
    }
}

/// Response of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub answer: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `POST /alumni`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAlumniResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alumni_id: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddAlumniResponse {
    pub fn added(name: &str, alumni_id: String) -> Self {
        Self {
            success: true,
            alumni_id: Some(alumni_id),
            message: format!("Alumni {} added successfully and embedded for search", name),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            alumni_id: None,
            message: "Failed to add alumni".to_string(),
            error: Some(error.to_string()),
        }
    }
}

/// Response of `GET /conversation/{session_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistoryResponse {
    pub success: bool,
    pub session_id: String,
    pub messages: Vec<ChatTurn>,
}

/// Plain message body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub store: ComponentStatus,
    pub index: ComponentStatus,
    pub record_count: usize,
    pub session_count: usize,
}
