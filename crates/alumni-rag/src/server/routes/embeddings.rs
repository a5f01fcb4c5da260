//! Forced index rebuild

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::MessageResponse;

/// POST /update-embeddings - Rebuild the index from the store
pub async fn update_embeddings(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    tracing::info!("Manually triggering embeddings update...");

    let report = state.service().rebuild().await?;
    tracing::info!(
        "Rebuilt index generation {} from {} records (persisted: {})",
        report.generation,
        report.records,
        report.persisted
    );

    let message = if report.records == 0 {
        "No updates were needed"
    } else {
        "Embeddings updated successfully"
    };
    Ok(Json(MessageResponse::new(message)))
}
