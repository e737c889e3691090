//! Thin GitHub REST client
//!
//! Every call shares one reqwest client carrying the per-sub-fetch timeout
//! (5s by default), so a slow remote degrades a single section of the
//! snapshot instead of stalling the run. Raw file content is requested via
//! the `application/vnd.github.raw+json` media type, which avoids base64
//! decoding.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::error;

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const USER_AGENT: &str = "repolens";

/// Errors from the GitHub client.
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("GitHub returned {status} for {path}")]
    Status { status: u16, path: String },
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Repository metadata as returned by `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == "dir"
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == "file"
    }
}

/// GitHub REST API client.
pub struct GithubClient {
    http: Client,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>, fetch_timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build GitHub HTTP client with timeout, using default client");
                Client::new()
            });

        Self {
            http,
            api_url: api_url.into(),
            token,
        }
    }

    fn repo_url(&self, owner: &str, repo: &str, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_url.trim_end_matches('/'),
            owner,
            repo,
            suffix
        )
    }

    fn request(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .get(url)
            .header("Accept", accept)
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder
    }

    /// Fetch repository metadata. The only fetch the extractor treats as fatal.
    pub async fn repository(&self, owner: &str, repo: &str) -> Result<RepoInfo, GithubError> {
        let url = self.repo_url(owner, repo, "");
        let response = self.request(&url, JSON_MEDIA_TYPE).send().await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(GithubError::NotFound(format!("{}/{}", owner, repo)));
        }
        if !status.is_success() {
            return Err(GithubError::Status {
                status: status.as_u16(),
                path: format!("{}/{}", owner, repo),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch the rendered README as raw text.
    pub async fn readme(&self, owner: &str, repo: &str) -> Result<String, GithubError> {
        let url = self.repo_url(owner, repo, "/readme");
        self.raw_text(&url, "readme").await
    }

    /// List one directory of the repository tree.
    pub async fn directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<DirEntry>, GithubError> {
        let suffix = if path.is_empty() {
            "/contents".to_string()
        } else {
            format!("/contents/{}", path)
        };
        let url = self.repo_url(owner, repo, &suffix);
        let response = self.request(&url, JSON_MEDIA_TYPE).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch one file's content as raw text.
    pub async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, GithubError> {
        let url = self.repo_url(owner, repo, &format!("/contents/{}", path));
        self.raw_text(&url, path).await
    }

    async fn raw_text(&self, url: &str, what: &str) -> Result<String, GithubError> {
        let response = self.request(url, RAW_MEDIA_TYPE).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::Status {
                status: status.as_u16(),
                path: what.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
