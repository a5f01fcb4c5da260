//! Conversation history endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::server::state::AppState;
use crate::types::{ConversationHistoryResponse, MessageResponse};

/// GET /conversation/:session_id
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ConversationHistoryResponse> {
    let messages = state.service().history(&session_id);
    Json(ConversationHistoryResponse {
        success: true,
        session_id,
        messages,
    })
}

/// DELETE /conversation/:session_id
pub async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<MessageResponse> {
    let message = if state.service().clear(&session_id) {
        format!("Conversation history cleared for session: {}", session_id)
    } else {
        format!("No conversation found for session: {}", session_id)
    };
    Json(MessageResponse::new(message))
}
