//! API routes for the resume parser server

use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::extract::DocumentKind;
use crate::server::state::AppState;
use crate::storage::{ResumeDb, SaveOutcome, StoredResume};
use crate::types::ParsedResume;

/// Build all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/parse-resume/", post(parse_resume))
        .route("/resumes", get(list_resumes))
        .route("/resumes/:email", get(get_resume))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Alumni Resume Parser! POST /parse-resume/ with a PDF or DOCX"
    }))
}

/// POST /parse-resume/ - Parse an uploaded PDF or DOCX
pub async fn parse_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParsedResume>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        // reject before reading the body
        DocumentKind::from_filename(&filename)?;
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read file: {}", e)))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| Error::BadRequest("Missing form field: file".to_string()))?;
    tracing::info!("Received resume: {} ({} bytes)", filename, data.len());

    let resume = state.parser().parse(&filename, data.to_vec()).await.map_err(|e| {
        tracing::error!("Failed to parse {}: {}", filename, e);
        e
    })?;

    if state.config().storage.persist_parsed {
        if let Some(db) = state.db() {
            match db.save(&resume).await {
                Ok(SaveOutcome::Inserted { id }) => tracing::debug!("Stored {} as {}", filename, id),
                Ok(SaveOutcome::Duplicate { .. }) => {}
                Err(e) => tracing::warn!("Failed to store parsed resume {}: {}", filename, e),
            }
        }
    }

    Ok(Json(resume))
}

/// GET /resumes - All stored resumes, newest first
pub async fn list_resumes(State(state): State<AppState>) -> Result<Json<Vec<StoredResume>>> {
    let resumes = storage(&state)?.list_all().await?;
    Ok(Json(resumes))
}

/// GET /resumes/:email - One stored resume
pub async fn get_resume(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<StoredResume>> {
    let found = storage(&state)?.get_by_email(&email).await?;
    found.map(Json).ok_or(Error::NotFound(email))
}

fn storage(state: &AppState) -> Result<&ResumeDb> {
    state
        .db()
        .ok_or_else(|| Error::storage("Resume storage is not available"))
}
