//! Health endpoint

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::HealthResponse;

/// GET /health - Probe the record store and the index
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.service().health().await;
    Json(HealthResponse {
        status: report.status(),
        store: report.store,
        index: report.index,
        record_count: report.record_count,
        session_count: report.session_count,
    })
}
