//! Alumni ingestion endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{AddAlumniResponse, NewAlumni};

/// POST /alumni - Store a new alumni record and make it searchable
///
/// Invalid input is rejected with 422; store or embedding failures are
/// reported in the body with `success: false`.
pub async fn add_alumni(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewAlumni>, JsonRejection>,
) -> Result<Json<AddAlumniResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let name = request.name.clone();
    tracing::info!("Adding new alumni: {}", name);

    let response = match state.service().add_record_and_index(request).await {
        Ok(alumni_id) => AddAlumniResponse::added(&name, alumni_id),
        Err(e) => {
            tracing::error!("Error adding alumni: {}", e);
            AddAlumniResponse::failed(e)
        }
    };

    Ok(Json(response))
}
