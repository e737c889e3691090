//! Repository snapshot extractor
//!
//! Builds a bounded textual snapshot of a remote repository: metadata,
//! README, a shallow directory walk, a `package.json` summary, and
//! size-capped excerpts of "important" files. Only the initial metadata
//! fetch is fatal; every other sub-fetch degrades to an absent section
//! through [`degrade`], so a flaky remote shrinks the snapshot instead of
//! failing the run.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::snapshot::{
    FileExcerpt, PackageSummary, RepoMetadata, RepoSnapshot,
};
use crate::domain::snapshot::truncate_chars;

use super::client::{GithubClient, GithubError};

/// Directories the walk descends into. Everything else is listed but not
/// entered; this bounds the number of API calls per extraction.
const WALK_DIR_ALLOWLIST: &[&str] = &[
    "src", "app", "pages", "components", "lib", "utils", "hooks", "services", "api", "supabase",
    "functions",
];

/// Maximum directory nesting level the walk lists.
const MAX_WALK_DEPTH: usize = 3;

/// Path patterns considered "important" enough to excerpt. `*` matches any
/// run of characters, including separators.
const IMPORTANT_FILE_PATTERNS: &[&str] = &[
    "index.*",
    "main.*",
    "server.*",
    "src/index.*",
    "src/main.*",
    "src/app.*",
    "src/App.*",
    "src/server.*",
    "app/page.*",
    "app/layout.*",
    "app/*/page.*",
    "pages/index.*",
    "pages/_app.*",
    "components/*.tsx",
    "components/*.jsx",
    "src/components/*.tsx",
    "src/pages/*.tsx",
    "supabase/functions/*/index.ts",
    "vite.config.*",
    "next.config.*",
    "astro.config.*",
    "svelte.config.*",
];

/// Named config files fetched separately with a tighter cap.
const CONFIG_FILE_CANDIDATES: &[&str] = &[
    "tsconfig.json",
    "next.config.js",
    "vite.config.ts",
    "tailwind.config.js",
    "Dockerfile",
    ".env.example",
];

const MAX_SOURCE_FILES: usize = 15;
const SOURCE_BUDGET_CHARS: usize = 40_000;
const SOURCE_FILE_CAP_CHARS: usize = 4_000;
const MAX_CONFIG_FILES: usize = 3;
const CONFIG_FILE_CAP_CHARS: usize = 1_500;
const README_CAP_CHARS: usize = 4_000;

/// Fatal extraction errors. Everything non-fatal is degraded instead.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Repository not found or unreachable: {0}")]
    RepositoryNotFound(String),
}

/// Result of a successful extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub snapshot: RepoSnapshot,
    /// `snapshot.to_context()`, assembled once
    pub context: String,
}

/// Extracts bounded snapshots through a [`GithubClient`].
pub struct SnapshotExtractor {
    client: Arc<GithubClient>,
}

impl SnapshotExtractor {
    pub fn new(client: Arc<GithubClient>) -> Self {
        Self { client }
    }

    /// Extract a snapshot for `owner/repo`.
    ///
    /// `display_name` overrides the repository name in the snapshot
    /// metadata so the context header matches what the user called the
    /// project.
    pub async fn extract(
        &self,
        owner: &str,
        repo: &str,
        display_name: &str,
    ) -> Result<Extraction, ExtractError> {
        let info = match self.client.repository(owner, repo).await {
            Ok(info) => info,
            Err(e) => {
                return Err(ExtractError::RepositoryNotFound(format!(
                    "{}/{}: {}",
                    owner, repo, e
                )));
            }
        };

        let metadata = RepoMetadata {
            name: if display_name.is_empty() {
                info.name.clone()
            } else {
                display_name.to_string()
            },
            description: info.description.clone(),
            language: info.language.clone(),
            stars: info.stargazers_count,
            forks: info.forks_count,
        };

        let readme = degrade("readme", self.client.readme(owner, repo).await)
            .map(|text| truncate_chars(&text, README_CAP_CHARS));

        let (file_tree, files) = self.walk_tree(owner, repo).await;

        let package_summary = if files.iter().any(|f| f == "package.json") {
            degrade(
                "package.json",
                self.client.file_content(owner, repo, "package.json").await,
            )
            .and_then(|raw| parse_package_json(&raw))
        } else {
            None
        };

        let source_excerpts = self.fetch_source_excerpts(owner, repo, &files).await;
        let config_excerpts = self
            .fetch_config_excerpts(owner, repo, &source_excerpts)
            .await;

        let snapshot = RepoSnapshot {
            metadata,
            readme,
            file_tree,
            package_summary,
            source_excerpts,
            config_excerpts,
        };
        let context = snapshot.to_context();

        info!(
            repository = %format!("{}/{}", owner, repo),
            tree_entries = snapshot.file_tree.len(),
            source_files = snapshot.source_excerpts.len(),
            context_chars = context.chars().count(),
            "Snapshot extracted"
        );

        Ok(Extraction { snapshot, context })
    }

    /// Breadth-first walk, bounded by depth and the directory allow-list.
    ///
    /// Returns the flattened tree listing (directories suffixed with '/')
    /// and the plain file paths encountered, both in deterministic order.
    async fn walk_tree(&self, owner: &str, repo: &str) -> (Vec<String>, Vec<String>) {
        let mut tree = Vec::new();
        let mut files = Vec::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((String::new(), 0));

        while let Some((dir_path, level)) = queue.pop_front() {
            let listing = match degrade(
                &format!("contents/{}", dir_path),
                self.client.directory(owner, repo, &dir_path).await,
            ) {
                Some(listing) => listing,
                None => continue,
            };

            let mut entries = listing;
            entries.sort_by(|a, b| a.path.cmp(&b.path));

            for entry in entries {
                if entry.is_dir() {
                    tree.push(format!("{}/", entry.path));
                    let descend = level + 1 < MAX_WALK_DEPTH
                        && WALK_DIR_ALLOWLIST.contains(&entry.name.as_str());
                    if descend {
                        queue.push_back((entry.path, level + 1));
                    }
                } else if entry.is_file() {
                    tree.push(entry.path.clone());
                    files.push(entry.path);
                }
            }
        }

        (tree, files)
    }

    async fn fetch_source_excerpts(
        &self,
        owner: &str,
        repo: &str,
        files: &[String],
    ) -> Vec<FileExcerpt> {
        let mut excerpts = Vec::new();
        let mut used_chars = 0usize;

        for path in files {
            if excerpts.len() >= MAX_SOURCE_FILES || used_chars >= SOURCE_BUDGET_CHARS {
                break;
            }
            if path == "package.json" || !is_important_file(path) {
                continue;
            }

            let remaining = SOURCE_BUDGET_CHARS - used_chars;
            let cap = SOURCE_FILE_CAP_CHARS.min(remaining);

            let Some(content) = degrade(path, self.client.file_content(owner, repo, path).await)
            else {
                continue;
            };

            let total_chars = content.chars().count();
            let excerpt_content = truncate_chars(&content, cap);
            used_chars += excerpt_content.chars().count();
            excerpts.push(FileExcerpt {
                path: path.clone(),
                content: excerpt_content,
                truncated: total_chars > cap,
            });
        }

        excerpts
    }

    async fn fetch_config_excerpts(
        &self,
        owner: &str,
        repo: &str,
        already_fetched: &[FileExcerpt],
    ) -> Vec<FileExcerpt> {
        let mut excerpts = Vec::new();

        for name in CONFIG_FILE_CANDIDATES {
            if excerpts.len() >= MAX_CONFIG_FILES {
                break;
            }
            if already_fetched.iter().any(|e| e.path == *name) {
                continue;
            }

            let Some(content) = degrade(name, self.client.file_content(owner, repo, name).await)
            else {
                continue;
            };

            let total_chars = content.chars().count();
            let excerpt_content = truncate_chars(&content, CONFIG_FILE_CAP_CHARS);
            excerpts.push(FileExcerpt {
                path: name.to_string(),
                content: excerpt_content,
                truncated: total_chars > CONFIG_FILE_CAP_CHARS,
            });
        }

        excerpts
    }
}

/// Collapse a sub-fetch failure into an absent value.
///
/// This is the extractor's graceful-degradation seam: the error is typed
/// and logged, never propagated.
fn degrade<T>(what: &str, result: Result<T, GithubError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(what, error = %e, "Sub-fetch degraded, section omitted");
            None
        }
    }
}

/// Whether a path matches the important-file allow-list.
fn is_important_file(path: &str) -> bool {
    IMPORTANT_FILE_PATTERNS
        .iter()
        .any(|pattern| matches_pattern(path, pattern))
}

/// Minimal glob: `*` matches any run of characters (separators included).
fn matches_pattern(path: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return path == pattern;
    }

    let mut rest = path;

    // Anchored prefix
    let first = parts[0];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    // Anchored suffix
    let last = parts[parts.len() - 1];
    if !rest.ends_with(last) {
        return false;
    }
    let rest_end = rest.len() - last.len();
    rest = &rest[..rest_end];

    // Middle fragments, in order
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }

    true
}

/// Parse the interesting parts of a `package.json` into a summary with
/// sorted, deterministic listings.
fn parse_package_json(raw: &str) -> Option<PackageSummary> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "package.json did not parse, section omitted");
            return None;
        }
    };

    let sorted_keys = |field: &str| -> Vec<String> {
        let mut keys: Vec<String> = value
            .get(field)
            .and_then(|v| v.as_object())
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    };

    Some(PackageSummary {
        name: value.get("name").and_then(|v| v.as_str()).map(String::from),
        version: value
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from),
        dependencies: sorted_keys("dependencies"),
        dev_dependencies: sorted_keys("devDependencies"),
        scripts: sorted_keys("scripts"),
    })
}

/// Parse `owner/repo` out of a GitHub URL.
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    let trimmed = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");
    let rest = trimmed.strip_prefix("github.com/")?;

    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?.trim_end_matches(".git");

    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
