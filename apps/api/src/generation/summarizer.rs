//! README → resume-ready project summary.

use std::collections::BTreeMap;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::generation::prompts::{build_summary_prompt, SUMMARY_SYSTEM};
use crate::llm_client::{ChatMessage, GenerationRequest, TextGenerator};

const SUMMARY_ATTEMPTS: u32 = 3;
const SUMMARY_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 300;

/// Summarisation settings: the primary model on the first attempt, the fallback on
/// every retry, and the pause between consecutive READMEs to stay under provider
/// rate limits.
#[derive(Debug, Clone)]
pub struct SummaryModels {
    pub primary: String,
    pub fallback: String,
    pub pause: Duration,
}

/// Text used in place of a summary when every attempt failed.
pub fn unavailable_summary(repo_name: &str) -> String {
    format!("Project: {repo_name} - Unable to generate summary")
}

/// Summarises one README. Never fails: after three attempts the placeholder text is returned.
pub async fn summarize_readme(
    llm: &dyn TextGenerator,
    models: &SummaryModels,
    repo_name: &str,
    readme: &str,
) -> String {
    let prompt = build_summary_prompt(repo_name, readme);

    for attempt in 1..=SUMMARY_ATTEMPTS {
        let model = if attempt == 1 {
            &models.primary
        } else {
            &models.fallback
        };
        let request = GenerationRequest {
            model: model.clone(),
            messages: vec![
                ChatMessage::system(SUMMARY_SYSTEM),
                ChatMessage::user(prompt.clone()),
            ],
            temperature: SUMMARY_TEMPERATURE,
            max_tokens: SUMMARY_MAX_TOKENS,
        };

        match llm.generate(&request).await {
            Ok(text) => return clean_summary(&text),
            Err(e) => warn!(
                "Summary attempt {}/{} for {} failed: {}",
                attempt, SUMMARY_ATTEMPTS, repo_name, e
            ),
        }
    }

    warn!("Giving up on summary for {repo_name}");
    unavailable_summary(repo_name)
}

/// Summarises every README in name order.
pub async fn summarize_projects(
    llm: &dyn TextGenerator,
    models: &SummaryModels,
    readmes: &BTreeMap<String, String>,
) -> IndexMap<String, String> {
    let total = readmes.len();
    let mut summaries = IndexMap::with_capacity(total);

    for (i, (name, readme)) in readmes.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(models.pause).await;
        }
        info!("Summarizing project {}/{}: {}", i + 1, total, name);
        let summary = summarize_readme(llm, models, name, readme).await;
        summaries.insert(name.clone(), summary);
    }

    summaries
}

/// Joins project summaries into the portfolio text handed to generation.
pub fn format_project_portfolio(projects: &IndexMap<String, String>) -> String {
    projects
        .iter()
        .map(|(name, summary)| format!("**{name}**: {summary}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn clean_summary(text: &str) -> String {
    text.replace("\"\"\"", "")
        .replace("'''", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::LlmError;

    /// Fails the first `failures` calls, then echoes the model name; records every model used.
    struct FlakyModel {
        failures: usize,
        seen: Mutex<Vec<String>>,
    }

    impl FlakyModel {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FlakyModel {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(request.model.clone());
            if seen.len() <= self.failures {
                return Err(LlmError::EmptyContent);
            }
            Ok(format!("  \"\"\"Built   with\n{}\"\"\" ", request.model))
        }
    }

    fn models() -> SummaryModels {
        SummaryModels {
            primary: "primary".to_string(),
            fallback: "fallback".to_string(),
            pause: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_summary_is_cleaned() {
        let llm = FlakyModel::new(0);
        let summary = summarize_readme(&llm, &models(), "demo", "# Demo").await;
        assert_eq!(summary, "Built with primary");
    }

    #[tokio::test]
    async fn test_retries_switch_to_fallback_model() {
        let llm = FlakyModel::new(2);
        let summary = summarize_readme(&llm, &models(), "demo", "# Demo").await;
        assert_eq!(summary, "Built with fallback");
        assert_eq!(
            *llm.seen.lock().unwrap(),
            vec!["primary", "fallback", "fallback"]
        );
    }

    #[tokio::test]
    async fn test_exhausted_attempts_use_placeholder() {
        let llm = FlakyModel::new(10);
        let summary = summarize_readme(&llm, &models(), "demo", "# Demo").await;
        assert_eq!(summary, "Project: demo - Unable to generate summary");
        assert_eq!(llm.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_projects_are_summarized_in_name_order() {
        let llm = FlakyModel::new(0);
        let readmes = BTreeMap::from([
            ("zeta".to_string(), "z".to_string()),
            ("alpha".to_string(), "a".to_string()),
        ]);
        let summaries = summarize_projects(&llm, &models(), &readmes).await;
        assert_eq!(
            summaries.keys().collect::<Vec<_>>(),
            vec!["alpha", "zeta"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_consecutive_summaries() {
        let llm = FlakyModel::new(0);
        let readmes = BTreeMap::from([
            ("a".to_string(), "a".to_string()),
            ("b".to_string(), "b".to_string()),
            ("c".to_string(), "c".to_string()),
        ]);
        let started = tokio::time::Instant::now();
        summarize_projects(&llm, &models(), &readmes).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(6), "{elapsed:?}");

        let single = BTreeMap::from([("x".to_string(), "x".to_string())]);
        let started = tokio::time::Instant::now();
        summarize_projects(&llm, &models(), &single).await;
        assert!(started.elapsed() < Duration::from_millis(1));
    }

    #[test]
    fn test_portfolio_format() {
        let mut projects = IndexMap::new();
        projects.insert("manual_projects".to_string(), "Built a CLI.".to_string());
        projects.insert("api".to_string(), "REST service.".to_string());
        assert_eq!(
            format_project_portfolio(&projects),
            "**manual_projects**: Built a CLI.\n\n**api**: REST service."
        );
    }
}
