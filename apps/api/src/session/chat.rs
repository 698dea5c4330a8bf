//! One chat edit turn: `Idle → Processing → Idle`, with the return to `Idle` guaranteed.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::editing::apply::CommandFailure;
use crate::editing::{CommandInterpreter, Interpretation};
use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::session::store::{MessageRole, SessionStore, TranscriptEntry, TurnState};

pub const NOT_UNDERSTOOD_MESSAGE: &str =
    "I couldn't understand your request. Please be more specific about what you'd like to change.";
pub const NOTHING_APPLIED_MESSAGE: &str =
    "None of the requested changes could be applied to your resume.";

/// Returns the session to `Idle` when dropped, whether the turn finished or was abandoned.
pub struct TurnGuard {
    store: SessionStore,
    id: Uuid,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let _ = self.store.update(self.id, |session| {
            session.turn = TurnState::Idle;
            Ok(())
        });
    }
}

/// Starts a turn: records the user message, marks the session `Processing` and hands back
/// a snapshot of the current document to edit.
pub fn begin_turn(
    store: &SessionStore,
    id: Uuid,
    instruction: &str,
) -> Result<(TurnGuard, ResumeDocument), AppError> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let document = store.update(id, |session| {
        session.ensure_idle()?;
        let document = session.document.clone().ok_or_else(|| {
            AppError::Validation("Generate a resume before editing it through chat".to_string())
        })?;
        session
            .transcript
            .push(TranscriptEntry::new(MessageRole::User, instruction));
        session.turn = TurnState::Processing;
        Ok(document)
    })?;

    let guard = TurnGuard {
        store: store.clone(),
        id,
    };
    Ok((guard, document))
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub reply: TranscriptEntry,
    pub applied: usize,
    pub failures: Vec<CommandFailure>,
    pub document: ResumeDocument,
}

/// Records the outcome of an interpretation. The session's document is replaced only
/// when at least one command applied.
pub fn complete_turn(
    store: &SessionStore,
    id: Uuid,
    interpretation: Interpretation,
) -> Result<ChatOutcome, AppError> {
    let Interpretation {
        document,
        parsed,
        report,
    } = interpretation;

    let reply = if parsed == 0 {
        TranscriptEntry::new(MessageRole::Error, NOT_UNDERSTOOD_MESSAGE)
    } else if report.applied == 0 {
        TranscriptEntry::new(MessageRole::Error, NOTHING_APPLIED_MESSAGE)
    } else {
        TranscriptEntry::new(
            MessageRole::Assistant,
            format!("Resume updated! Applied {} change(s).", report.applied),
        )
    };

    store.update(id, |session| {
        if report.applied > 0 {
            session.document = Some(document);
        }
        session.transcript.push(reply.clone());
        let document = session.document.clone().unwrap_or_default();
        Ok(ChatOutcome {
            reply,
            applied: report.applied,
            failures: report.failures,
            document,
        })
    })
}

/// Runs a full chat turn against the session's current document.
pub async fn chat_turn(
    store: &SessionStore,
    interpreter: &CommandInterpreter,
    id: Uuid,
    instruction: &str,
) -> Result<ChatOutcome, AppError> {
    let (guard, document) = begin_turn(store, id, instruction)?;

    let interpretation = interpreter.interpret(&document, instruction.trim()).await;
    if !interpretation.report.failures.is_empty() {
        warn!(
            "Session {}: {} edit command(s) skipped",
            id,
            interpretation.report.failures.len()
        );
    }

    let outcome = complete_turn(store, id, interpretation);
    drop(guard);

    if let Ok(outcome) = &outcome {
        info!("Session {}: chat turn applied {} change(s)", id, outcome.applied);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::{GenerationRequest, LlmError, TextGenerator};

    struct FixedReply(&'static str);

    #[async_trait]
    impl TextGenerator for FixedReply {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    /// Never answers; used to hold a turn open.
    struct Stalled;

    #[async_trait]
    impl TextGenerator for Stalled {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            std::future::pending().await
        }
    }

    fn interpreter(llm: Arc<dyn TextGenerator>) -> CommandInterpreter {
        CommandInterpreter::new(llm, "m".to_string(), 1, Duration::from_millis(1))
    }

    fn store_with_document() -> (SessionStore, Uuid) {
        let store = SessionStore::new();
        let id = store.create().id;
        store
            .update(id, |s| {
                let mut doc = ResumeDocument::default();
                doc.skills = vec!["Python".to_string()];
                s.document = Some(doc);
                Ok(())
            })
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_successful_turn_replaces_document() {
        let (store, id) = store_with_document();
        let llm = Arc::new(FixedReply(
            r#"[{"op": "append", "path": ["skills"], "value": "Go"}]"#,
        ));
        let outcome = chat_turn(&store, &interpreter(llm), id, "add Go").await.unwrap();

        assert_eq!(outcome.reply.text, "Resume updated! Applied 1 change(s).");
        assert_eq!(outcome.reply.role, MessageRole::Assistant);
        let session = store.snapshot(id).unwrap();
        assert_eq!(session.document.unwrap().skills, vec!["Python", "Go"]);
        assert_eq!(session.transcript.len(), 2);
        assert_eq!(session.turn, TurnState::Idle);
    }

    #[tokio::test]
    async fn test_not_understood_turn() {
        let (store, id) = store_with_document();
        let llm = Arc::new(FixedReply("[]"));
        let outcome = chat_turn(&store, &interpreter(llm), id, "do the thing")
            .await
            .unwrap();
        assert_eq!(outcome.reply.role, MessageRole::Error);
        assert_eq!(outcome.reply.text, NOT_UNDERSTOOD_MESSAGE);
    }

    #[tokio::test]
    async fn test_all_commands_failing_keeps_document() {
        let (store, id) = store_with_document();
        let llm = Arc::new(FixedReply(
            r#"[{"op": "remove_at", "path": ["skills"], "index": 5}]"#,
        ));
        let outcome = chat_turn(&store, &interpreter(llm), id, "remove the sixth skill")
            .await
            .unwrap();
        assert_eq!(outcome.reply.text, NOTHING_APPLIED_MESSAGE);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(store.snapshot(id).unwrap().document.unwrap().skills, vec!["Python"]);
    }

    #[tokio::test]
    async fn test_turn_requires_document_and_text() {
        let store = SessionStore::new();
        let id = store.create().id;
        let llm = Arc::new(FixedReply("[]"));
        let result = chat_turn(&store, &interpreter(llm.clone()), id, "add Go").await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let (store, id) = store_with_document();
        let result = chat_turn(&store, &interpreter(llm), id, "   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.snapshot(id).unwrap().transcript.is_empty());
    }

    #[tokio::test]
    async fn test_second_turn_while_processing_is_rejected() {
        let (store, id) = store_with_document();
        let (guard, _) = begin_turn(&store, id, "first").unwrap();
        assert!(store.snapshot(id).unwrap().is_busy());

        let second = begin_turn(&store, id, "second");
        assert!(matches!(second, Err(AppError::Conflict(_))));

        drop(guard);
        assert_eq!(store.snapshot(id).unwrap().turn, TurnState::Idle);
    }

    #[tokio::test]
    async fn test_abandoned_turn_returns_to_idle() {
        let (store, id) = store_with_document();
        let interpreter = interpreter(Arc::new(Stalled));

        let turn = chat_turn(&store, &interpreter, id, "add Go");
        let timed_out = tokio::time::timeout(Duration::from_millis(20), turn).await;
        assert!(timed_out.is_err());

        let session = store.snapshot(id).unwrap();
        assert_eq!(session.turn, TurnState::Idle);
        assert_eq!(session.document.unwrap().skills, vec!["Python"]);
    }
}
