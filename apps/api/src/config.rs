use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::layout::StandardFont;

const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "llama3-70b-8192";
const DEFAULT_LLM_FALLBACK_MODEL: &str = "compound-beta-mini";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_fallback_model: String,
    pub llm_timeout: Duration,
    /// Attempts for the chat parse step, 1..=5.
    pub chat_parse_attempts: u32,
    pub chat_retry_backoff: Duration,
    /// Pause between consecutive README summaries.
    pub summary_pause: Duration,
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub export_font: StandardFont,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let llm_api_key = require_env(&get, "LLM_API_KEY")
            .or_else(|_| require_env(&get, "GROQ_API_KEY"))
            .context("Set LLM_API_KEY (or GROQ_API_KEY) to the chat-completions API key")?;

        let chat_parse_attempts: u32 = parse_env(&get, "CHAT_PARSE_ATTEMPTS", 1)?;
        if !(1..=5).contains(&chat_parse_attempts) {
            bail!("CHAT_PARSE_ATTEMPTS must be between 1 and 5, got {chat_parse_attempts}");
        }

        let export_font = or_default("EXPORT_FONT", "times")
            .parse::<StandardFont>()
            .map_err(anyhow::Error::msg)
            .context("EXPORT_FONT is invalid")?;

        Ok(Config {
            llm_api_key,
            llm_api_url: or_default("LLM_API_URL", DEFAULT_LLM_API_URL),
            llm_model: or_default("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_fallback_model: or_default("LLM_FALLBACK_MODEL", DEFAULT_LLM_FALLBACK_MODEL),
            llm_timeout: Duration::from_secs(parse_env(&get, "LLM_TIMEOUT_SECS", 120)?),
            chat_parse_attempts,
            chat_retry_backoff: Duration::from_millis(parse_env(
                &get,
                "CHAT_RETRY_BACKOFF_MS",
                2000,
            )?),
            summary_pause: Duration::from_millis(parse_env(&get, "SUMMARY_PAUSE_MS", 2000)?),
            github_api_url: or_default("GITHUB_API_URL", DEFAULT_GITHUB_API_URL),
            github_token: get("GITHUB_TOKEN"),
            export_font,
            port: parse_env(&get, "PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}

fn require_env(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key}='{raw}' is invalid: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("LLM_API_KEY", "k")]).unwrap();
        assert_eq!(config.llm_api_url, DEFAULT_LLM_API_URL);
        assert_eq!(config.llm_model, "llama3-70b-8192");
        assert_eq!(config.chat_parse_attempts, 1);
        assert_eq!(config.chat_retry_backoff, Duration::from_millis(2000));
        assert_eq!(config.summary_pause, Duration::from_millis(2000));
        assert_eq!(config.llm_timeout, Duration::from_secs(120));
        assert_eq!(config.export_font, StandardFont::Times);
        assert_eq!(config.port, 8080);
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_api_key_falls_back_to_groq_variable() {
        let config = load(&[("GROQ_API_KEY", "gsk")]).unwrap();
        assert_eq!(config.llm_api_key, "gsk");

        let err = load(&[]).unwrap_err();
        assert!(format!("{err:#}").contains("LLM_API_KEY"));
    }

    #[test]
    fn test_rejects_out_of_range_and_malformed_values() {
        assert!(load(&[("LLM_API_KEY", "k"), ("CHAT_PARSE_ATTEMPTS", "0")]).is_err());
        assert!(load(&[("LLM_API_KEY", "k"), ("CHAT_PARSE_ATTEMPTS", "6")]).is_err());
        assert!(load(&[("LLM_API_KEY", "k"), ("PORT", "http")]).is_err());
        assert!(load(&[("LLM_API_KEY", "k"), ("EXPORT_FONT", "wingdings")]).is_err());

        let config = load(&[
            ("LLM_API_KEY", "k"),
            ("CHAT_PARSE_ATTEMPTS", "3"),
            ("EXPORT_FONT", "Courier"),
            ("GITHUB_TOKEN", "ghp"),
        ])
        .unwrap();
        assert_eq!(config.chat_parse_attempts, 3);
        assert_eq!(config.export_font, StandardFont::Courier);
        assert_eq!(config.github_token.as_deref(), Some("ghp"));
    }
}
