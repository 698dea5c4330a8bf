//! Axum route handlers for project intake and resume generation.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::generate_structured_resume;
use crate::generation::summarizer::summarize_projects;
use crate::models::resume::ResumeDocument;
use crate::session::events::{
    generation_inputs, merge_project_summaries, set_manual_projects, store_generated_document,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ManualProjectsRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubProjectsRequest {
    pub username: String,
    /// Overrides the server's default token for this fetch.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub total_projects: usize,
}

#[derive(Debug, Serialize)]
pub struct GithubProjectsResponse {
    pub repositories: usize,
    pub summarized: Vec<String>,
    pub total_projects: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub job_description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/v1/sessions/:id/projects/manual
pub async fn handle_set_manual_projects(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ManualProjectsRequest>,
) -> Result<Json<ProjectsResponse>, AppError> {
    set_manual_projects(&state.sessions, id, &request.text)?;
    let total_projects = state.sessions.snapshot(id)?.project_summaries.len();
    Ok(Json(ProjectsResponse { total_projects }))
}

/// POST /api/v1/sessions/:id/projects/github
///
/// Lists the user's repositories, fetches READMEs concurrently, summarises each one and
/// merges the summaries into the session.
pub async fn handle_fetch_github_projects(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GithubProjectsRequest>,
) -> Result<Json<GithubProjectsResponse>, AppError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    state.sessions.snapshot(id)?;

    let token = request.token.as_deref().filter(|t| !t.trim().is_empty());
    let harvest = state.github.harvest(username, token).await?;
    info!(
        "Session {}: {} of {} repositories have a README",
        id,
        harvest.readmes.len(),
        harvest.total_repositories
    );

    let summaries =
        summarize_projects(state.llm.as_ref(), &state.summary_models(), &harvest.readmes).await;
    let summarized = summaries.keys().cloned().collect();
    let total_projects = merge_project_summaries(&state.sessions, id, summaries)?;

    Ok(Json(GithubProjectsResponse {
        repositories: harvest.total_repositories,
        summarized,
        total_projects,
    }))
}

/// POST /api/v1/sessions/:id/generate
///
/// Resume text + project portfolio + job description → LLM → structured document.
/// Replaces the session's document and clears the chat transcript.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<ResumeDocument>, AppError> {
    let inputs = generation_inputs(&state.sessions, id, &request.job_description)?;

    let document = generate_structured_resume(
        state.llm.as_ref(),
        &state.config.llm_model,
        &inputs.resume_text,
        &inputs.portfolio,
        &inputs.job_description,
    )
    .await?;

    store_generated_document(&state.sessions, id, document.clone())?;
    info!("Session {}: generated resume for {}", id, document.subject_name());
    Ok(Json(document))
}
