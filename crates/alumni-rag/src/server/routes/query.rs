//! Question answering endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query - Ask a question about alumni
pub async fn query_alumni(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    tracing::info!(
        "Processing query: {}... (session {})",
        request.question.chars().take(50).collect::<String>(),
        request.session_id
    );

    let outcome = state
        .service()
        .answer(&request.question, &request.session_id)
        .await;

    Ok(Json(QueryResponse {
        success: outcome.success,
        answer: outcome.answer,
        session_id: request.session_id,
        error: outcome.error,
    }))
}
