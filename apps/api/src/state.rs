use std::sync::Arc;

use crate::config::Config;
use crate::editing::CommandInterpreter;
use crate::generation::summarizer::SummaryModels;
use crate::github::GithubClient;
use crate::layout::PageConfig;
use crate::llm_client::TextGenerator;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Model seam used by summarisation and generation. Tests swap in a stub.
    pub llm: Arc<dyn TextGenerator>,
    pub interpreter: CommandInterpreter,
    pub github: GithubClient,
    pub sessions: SessionStore,
    /// Page geometry and export font for PDF rendering.
    pub page_config: PageConfig,
}

impl AppState {
    pub fn summary_models(&self) -> SummaryModels {
        SummaryModels {
            primary: self.config.llm_model.clone(),
            fallback: self.config.llm_fallback_model.clone(),
            pause: self.config.summary_pause,
        }
    }
}
