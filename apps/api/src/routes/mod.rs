pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::generation::handlers as generation;
use crate::ingest::handlers as ingest;
use crate::render::handlers as render;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(session::handle_get_session).delete(session::handle_delete_session),
        )
        // Inputs
        .route(
            "/api/v1/sessions/:id/resume/text",
            put(ingest::handle_set_resume_text),
        )
        .route(
            "/api/v1/sessions/:id/resume/upload",
            post(ingest::handle_upload_resume),
        )
        .route(
            "/api/v1/sessions/:id/projects/manual",
            put(generation::handle_set_manual_projects),
        )
        .route(
            "/api/v1/sessions/:id/projects/github",
            post(generation::handle_fetch_github_projects),
        )
        // Document
        .route(
            "/api/v1/sessions/:id/generate",
            post(generation::handle_generate),
        )
        .route(
            "/api/v1/sessions/:id/document",
            put(session::handle_replace_document),
        )
        .route(
            "/api/v1/sessions/:id/chat",
            post(session::handle_chat).delete(session::handle_clear_chat),
        )
        .route("/api/v1/sessions/:id/export", get(render::handle_export))
        .with_state(state)
}
