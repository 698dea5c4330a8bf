use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::extract::extract_text;
use crate::session::events::set_resume_text;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ResumeTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeTextResponse {
    pub characters: usize,
    /// The extracted text, so the client can show what was read from an upload.
    pub text: String,
}

/// PUT /api/v1/sessions/:id/resume/text
pub async fn handle_set_resume_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResumeTextRequest>,
) -> Result<Json<ResumeTextResponse>, AppError> {
    let characters = set_resume_text(&state.sessions, id, &request.text)?;
    Ok(Json(ResumeTextResponse {
        characters,
        text: request.text.trim().to_string(),
    }))
}

/// POST /api/v1/sessions/:id/resume/upload
///
/// Multipart body with a single `file` field (PDF or plain text).
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ResumeTextResponse>, AppError> {
    // Fail on an unknown session before reading the body.
    state.sessions.snapshot(id)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        info!("Session {}: extracting {} ({} bytes)", id, file_name, bytes.len());
        let text = extract_text(&file_name, content_type.as_deref(), bytes.to_vec()).await?;
        let characters = set_resume_text(&state.sessions, id, &text)?;
        return Ok(Json(ResumeTextResponse { characters, text }));
    }

    Err(AppError::Validation(format!(
        "Multipart body must contain a '{UPLOAD_FIELD}' field"
    )))
}
