use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::session::chat::{chat_turn, ChatOutcome};
use crate::session::events::{clear_chat, replace_document};
use crate::session::store::Session;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreatedResponse>) {
    let session = state.sessions.create();
    (
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id: session.id,
        }),
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(state.sessions.snapshot(id)?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

/// PUT /api/v1/sessions/:id/document
///
/// Replaces the whole document with the edited form contents.
pub async fn handle_replace_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(document): Json<ResumeDocument>,
) -> Result<Json<ResumeDocument>, AppError> {
    replace_document(&state.sessions, id, document.clone())?;
    Ok(Json(document))
}

/// POST /api/v1/sessions/:id/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatOutcome>, AppError> {
    let outcome = chat_turn(&state.sessions, &state.interpreter, id, &request.message).await?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/sessions/:id/chat
pub async fn handle_clear_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    clear_chat(&state.sessions, id)?;
    Ok(StatusCode::NO_CONTENT)
}
