use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::editing::apply::{apply_commands, ApplyReport};
use crate::editing::command::MutationCommand;
use crate::editing::extract::extract_command_list;
use crate::editing::prompts::{build_edit_prompt, EDIT_SYSTEM};
use crate::llm_client::{strip_code_fences, ChatMessage, GenerationRequest, LlmError, TextGenerator};
use crate::models::resume::ResumeDocument;

const PARSE_TEMPERATURE: f32 = 0.1;
const PARSE_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("language model unavailable: {0}")]
    ExternalService(#[from] LlmError),

    #[error("model output is not a valid command list: {0}")]
    MalformedModelOutput(String),
}

/// Parses model output into commands.
///
/// Output with no bracketed list at all means the model had nothing to do and yields
/// an empty batch. A list that is present but does not parse as commands fails as a
/// whole; no partial batch is ever returned.
pub fn parse_commands(text: &str) -> Result<Vec<MutationCommand>, InterpretError> {
    let Some(list) = extract_command_list(strip_code_fences(text)) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(list).map_err(|e| InterpretError::MalformedModelOutput(e.to_string()))
}

/// Result of one chat edit: the new document plus what happened to each command.
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub document: ResumeDocument,
    pub parsed: usize,
    pub report: ApplyReport,
}

/// Turns free-text edit instructions into applied mutations.
#[derive(Clone)]
pub struct CommandInterpreter {
    llm: Arc<dyn TextGenerator>,
    model: String,
    attempts: u32,
    backoff: Duration,
}

impl CommandInterpreter {
    pub fn new(llm: Arc<dyn TextGenerator>, model: String, attempts: u32, backoff: Duration) -> Self {
        Self {
            llm,
            model,
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Asks the model for the commands that carry out `instruction` on `doc`.
    ///
    /// Never fails: an unreachable model (after the bounded retries) or output that
    /// does not parse both degrade to an empty list.
    pub async fn parse(&self, doc: &ResumeDocument, instruction: &str) -> Vec<MutationCommand> {
        let request = GenerationRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(EDIT_SYSTEM),
                ChatMessage::user(build_edit_prompt(&doc.canonical_json(), instruction)),
            ],
            temperature: PARSE_TEMPERATURE,
            max_tokens: PARSE_MAX_TOKENS,
        };

        for attempt in 1..=self.attempts {
            match self.parse_once(&request).await {
                Ok(commands) => {
                    info!("Parsed {} edit commands", commands.len());
                    return commands;
                }
                Err(InterpretError::MalformedModelOutput(reason)) => {
                    warn!("Discarding malformed edit commands: {reason}");
                    return Vec::new();
                }
                Err(InterpretError::ExternalService(e)) => {
                    warn!(
                        "Edit parse attempt {}/{} failed: {}",
                        attempt, self.attempts, e
                    );
                    if attempt < self.attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }

        warn!("Edit parse gave up after {} attempts", self.attempts);
        Vec::new()
    }

    async fn parse_once(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<MutationCommand>, InterpretError> {
        let reply = self.llm.generate(request).await?;
        debug!("Raw edit commands response: {reply}");
        parse_commands(&reply)
    }

    /// Parses `instruction` and applies the resulting commands to a copy of `doc`.
    /// `doc` itself is never touched.
    pub async fn interpret(&self, doc: &ResumeDocument, instruction: &str) -> Interpretation {
        let commands = self.parse(doc, instruction).await;
        let mut document = doc.clone();
        let report = apply_commands(&mut document, &commands);
        Interpretation {
            document,
            parsed: commands.len(),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::editing::command::{Operation, PathSegment};

    /// Replays canned replies in order; `None` simulates an unreachable model.
    struct ScriptedModel {
        replies: Vec<Option<&'static str>>,
        calls: AtomicU32,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Option<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
            assert_eq!(request.max_tokens, PARSE_MAX_TOKENS);
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.replies.get(n).copied().flatten() {
                Some(text) => Ok(text.to_string()),
                None => Err(LlmError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    fn interpreter(model: Arc<ScriptedModel>, attempts: u32) -> CommandInterpreter {
        CommandInterpreter::new(
            model,
            "test-model".to_string(),
            attempts,
            Duration::from_millis(2000),
        )
    }

    fn doc() -> ResumeDocument {
        let mut doc = ResumeDocument::default();
        doc.skills = vec!["Python".to_string()];
        doc
    }

    #[test]
    fn test_parse_commands_from_fenced_reply() {
        let reply = "Sure:\n```json\n[{\"op\": \"append\", \"path\": [\"skills\"], \"value\": \"Go\"}]\n```";
        let commands = parse_commands(reply).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].path, vec![PathSegment::Key("skills".into())]);
        assert_eq!(commands[0].operation, Operation::Append("Go".into()));
    }

    #[test]
    fn test_parse_commands_without_list_is_empty() {
        assert!(parse_commands("I am not sure what you mean.").unwrap().is_empty());
    }

    #[test]
    fn test_one_bad_fragment_rejects_whole_batch() {
        let reply = r#"[{"op": "append", "path": ["skills"], "value": "Go"}, {"op": "eval", "path": ["skills"], "value": "x"}]"#;
        assert!(matches!(
            parse_commands(reply),
            Err(InterpretError::MalformedModelOutput(_))
        ));
    }

    #[test]
    fn test_code_strings_are_not_commands() {
        let reply = r#"["resume['skills'].append('Go')"]"#;
        assert!(parse_commands(reply).is_err());
    }

    #[tokio::test]
    async fn test_interpret_applies_to_copy() {
        let model = ScriptedModel::new(vec![Some(
            r#"[{"op": "append", "path": ["skills"], "value": "Go"}]"#,
        )]);
        let original = doc();
        let result = interpreter(model, 1).interpret(&original, "add Go").await;
        assert_eq!(result.parsed, 1);
        assert_eq!(result.report.applied, 1);
        assert_eq!(result.document.skills, vec!["Python", "Go"]);
        assert_eq!(original.skills, vec!["Python"]);
    }

    #[tokio::test]
    async fn test_malformed_output_degrades_without_retry() {
        let model = ScriptedModel::new(vec![Some("[{\"op\": \"set\"}]"), Some("[]")]);
        let commands = interpreter(model.clone(), 3).parse(&doc(), "x").await;
        assert!(commands.is_empty());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_failure_is_retried_then_succeeds() {
        let model = ScriptedModel::new(vec![
            None,
            Some(r#"[{"op": "remove_at", "path": ["skills"], "index": 0}]"#),
        ]);
        let commands = interpreter(model.clone(), 2).parse(&doc(), "drop python").await;
        assert_eq!(commands.len(), 1);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_yield_empty_list() {
        let model = ScriptedModel::new(vec![None, None, None]);
        let result = interpreter(model.clone(), 3).interpret(&doc(), "add Go").await;
        assert_eq!(model.calls(), 3);
        assert_eq!(result.parsed, 0);
        assert_eq!(result.document, doc());
    }
}
