//! Repository harvesting: list a user's repositories and pull their README files.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

const PAGE_SIZE: usize = 100;
const MAX_WORKERS: usize = 32;
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("user '{0}' not found")]
    UserNotFound(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(default)]
    download_url: Option<String>,
}

/// READMEs gathered for one handle.
#[derive(Debug, Default)]
pub struct Harvest {
    pub total_repositories: usize,
    pub readmes: BTreeMap<String, String>,
}

/// Worker pool size for README fan-out: available parallelism + 4, capped at 32.
pub fn worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 4).min(MAX_WORKERS)
}

/// Runs `fetch` for every repository with at most `workers` in flight and gathers the
/// non-empty results as they complete. Failed fetches are logged and left out.
pub async fn collect_readmes<F, Fut>(
    repos: Vec<Repository>,
    workers: usize,
    fetch: F,
) -> BTreeMap<String, String>
where
    F: Fn(Repository) -> Fut,
    Fut: Future<Output = Result<Option<String>, GithubError>>,
{
    let total = repos.len();
    let mut completions = stream::iter(repos)
        .map(|repo| {
            let name = repo.name.clone();
            let pending = fetch(repo);
            async move { (name, pending.await) }
        })
        .buffer_unordered(workers.max(1));

    let mut readmes = BTreeMap::new();
    let mut processed = 0usize;
    while let Some((name, result)) = completions.next().await {
        processed += 1;
        match result {
            Ok(Some(content)) if !content.trim().is_empty() => {
                debug!("Processed {}/{}: {} (README found)", processed, total, name);
                readmes.insert(name, content);
            }
            Ok(_) => debug!("Processed {}/{}: {} (no README)", processed, total, name),
            Err(e) => warn!("README fetch for {} failed: {}", name, e),
        }
    }

    info!("Found README files in {} out of {} repositories", readmes.len(), total);
    readmes
}

/// Client for the repository-hosting REST API.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
    default_token: Option<String>,
}

impl GithubClient {
    pub fn new(api_url: String, default_token: Option<String>) -> Result<Self, GithubError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(USER_AGENT)
                .build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            default_token,
        })
    }

    fn get(&self, url: &str, token: Option<&str>) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        match token.or(self.default_token.as_deref()) {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    /// Lists every repository of `handle`, one page of 100 at a time until an empty page.
    pub async fn list_repositories(
        &self,
        handle: &str,
        token: Option<&str>,
    ) -> Result<Vec<Repository>, GithubError> {
        let mut repos = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!("{}/users/{}/repos", self.api_url, handle);
            let response = self
                .get(&url, token)
                .query(&[("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())])
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(GithubError::UserNotFound(handle.to_string()));
            }
            if !status.is_success() {
                return Err(GithubError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            let batch: Vec<Repository> = response.json().await?;
            if batch.is_empty() {
                break;
            }
            debug!("Fetched page {} with {} repositories", page, batch.len());
            repos.extend(batch);
            page += 1;
        }

        info!("Listed {} repositories for {}", repos.len(), handle);
        Ok(repos)
    }

    /// Fetches the README at the root of `repo`'s default branch, if there is one.
    pub async fn fetch_readme(
        &self,
        handle: &str,
        repo: &Repository,
        token: Option<&str>,
    ) -> Result<Option<String>, GithubError> {
        let branch = repo.default_branch.as_deref().unwrap_or("main");
        let url = format!("{}/repos/{}/{}/contents", self.api_url, handle, repo.name);
        let response = self
            .get(&url, token)
            .query(&[("ref", branch)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let entries: Vec<ContentEntry> = response.json().await?;
        let Some(download_url) = entries
            .into_iter()
            .find(|entry| entry.name.to_lowercase().starts_with("readme"))
            .and_then(|entry| entry.download_url)
        else {
            return Ok(None);
        };

        let response = self.get(&download_url, token).send().await?;
        if !response.status().is_success() {
            return Err(GithubError::Status {
                status: response.status().as_u16(),
                url: download_url,
            });
        }
        Ok(Some(response.text().await?))
    }

    /// Lists `handle`'s repositories and collects their READMEs concurrently.
    pub async fn harvest(&self, handle: &str, token: Option<&str>) -> Result<Harvest, GithubError> {
        let repos = self.list_repositories(handle, token).await?;
        let total_repositories = repos.len();
        let readmes = collect_readmes(repos, worker_count(), |repo| async move {
            self.fetch_readme(handle, &repo, token).await
        })
        .await;

        Ok(Harvest {
            total_repositories,
            readmes,
        })
    }
}
