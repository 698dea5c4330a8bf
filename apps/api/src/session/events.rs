//! Session event handlers other than the chat turn.
//!
//! Each function is one discrete user event applied to the session under the store lock.

use indexmap::IndexMap;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::summarizer::format_project_portfolio;
use crate::models::resume::ResumeDocument;
use crate::session::store::{SessionStore, MANUAL_PROJECTS_KEY};

/// Inputs for resume generation, validated and copied out of the session.
#[derive(Debug, Clone)]
pub struct GenerationInputs {
    pub resume_text: String,
    pub portfolio: String,
    pub job_description: String,
}

pub fn set_resume_text(store: &SessionStore, id: Uuid, text: &str) -> Result<usize, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("resume text cannot be empty".to_string()));
    }
    store.update(id, |session| {
        session.resume_text = Some(text.to_string());
        Ok(text.len())
    })
}

/// Stores pasted project descriptions; blank text removes them.
pub fn set_manual_projects(store: &SessionStore, id: Uuid, text: &str) -> Result<(), AppError> {
    let text = text.trim();
    store.update(id, |session| {
        if text.is_empty() {
            session.project_summaries.shift_remove(MANUAL_PROJECTS_KEY);
        } else {
            session
                .project_summaries
                .insert(MANUAL_PROJECTS_KEY.to_string(), text.to_string());
        }
        Ok(())
    })
}

/// On fetch completion: merges freshly summarised projects, replacing same-named entries.
pub fn merge_project_summaries(
    store: &SessionStore,
    id: Uuid,
    summaries: IndexMap<String, String>,
) -> Result<usize, AppError> {
    store.update(id, |session| {
        let added = summaries.len();
        session.project_summaries.extend(summaries);
        info!(
            "Session {}: {} project summaries ({} new)",
            id,
            session.project_summaries.len(),
            added
        );
        Ok(session.project_summaries.len())
    })
}

/// Checks that everything generation needs is present.
pub fn generation_inputs(
    store: &SessionStore,
    id: Uuid,
    job_description: &str,
) -> Result<GenerationInputs, AppError> {
    let session = store.snapshot(id)?;
    session.ensure_idle()?;

    let resume_text = session
        .resume_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            AppError::Validation("Please provide your resume text or upload a file".to_string())
        })?;

    if session.project_summaries.is_empty() {
        return Err(AppError::Validation(
            "Please provide project information (GitHub or manual)".to_string(),
        ));
    }

    let job_description = job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation(
            "Please provide a job description".to_string(),
        ));
    }

    Ok(GenerationInputs {
        resume_text,
        portfolio: format_project_portfolio(&session.project_summaries),
        job_description: job_description.to_string(),
    })
}

/// Installs a newly generated document. The chat transcript refers to the old document,
/// so it is cleared.
pub fn store_generated_document(
    store: &SessionStore,
    id: Uuid,
    document: ResumeDocument,
) -> Result<(), AppError> {
    store.update(id, |session| {
        session.ensure_idle()?;
        session.document = Some(document);
        session.transcript.clear();
        Ok(())
    })
}

/// Replaces the document wholesale with the form's edited version.
pub fn replace_document(
    store: &SessionStore,
    id: Uuid,
    document: ResumeDocument,
) -> Result<(), AppError> {
    store.update(id, |session| {
        session.ensure_idle()?;
        if session.document.is_none() {
            return Err(AppError::Validation(
                "Generate a resume before editing it".to_string(),
            ));
        }
        session.document = Some(document);
        Ok(())
    })
}

pub fn clear_chat(store: &SessionStore, id: Uuid) -> Result<(), AppError> {
    store.update(id, |session| {
        session.transcript.clear();
        Ok(())
    })
}

/// The current document, for export.
pub fn current_document(store: &SessionStore, id: Uuid) -> Result<ResumeDocument, AppError> {
    store
        .snapshot(id)?
        .document
        .ok_or_else(|| AppError::Validation("Generate a resume before exporting it".to_string()))
}
