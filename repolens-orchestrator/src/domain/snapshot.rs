//! Repository snapshot
//!
//! The cached, structured textual extraction of a repository. The project
//! context string the prompts consume is rebuilt through
//! [`RepoSnapshot::to_context`] on both the fresh and the cached path, so
//! a cached re-run reproduces the original context byte for byte.

use serde::{Deserialize, Serialize};

/// Repository metadata captured at extraction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
}

/// Summary of a parsed `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Dependency names, sorted
    pub dependencies: Vec<String>,
    /// Dev-dependency names, sorted
    pub dev_dependencies: Vec<String>,
    /// Script names, sorted
    pub scripts: Vec<String>,
}

/// One size-capped file excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileExcerpt {
    pub path: String,
    pub content: String,
    pub truncated: bool,
}

/// The cached snapshot stored on the project row (`github_data`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub metadata: RepoMetadata,
    pub readme: Option<String>,
    /// Flattened file-tree listing; directories end with '/'
    pub file_tree: Vec<String>,
    pub package_summary: Option<PackageSummary>,
    pub source_excerpts: Vec<FileExcerpt>,
    pub config_excerpts: Vec<FileExcerpt>,
}

impl RepoSnapshot {
    /// Assemble the project-context string.
    ///
    /// Section order is fixed (metadata, README, file tree, package
    /// summary, source excerpts, config excerpts) and the output is a pure
    /// function of the snapshot.
    pub fn to_context(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("# {}\n\n", self.metadata.name));
        match &self.metadata.description {
            Some(description) => out.push_str(&format!("{}\n\n", description)),
            None => out.push_str("No description provided.\n\n"),
        }

        out.push_str("## Repository Metadata\n\n");
        out.push_str(&format!(
            "- Language: {}\n",
            self.metadata.language.as_deref().unwrap_or("Unknown")
        ));
        out.push_str(&format!("- Stars: {}\n", self.metadata.stars));
        out.push_str(&format!("- Forks: {}\n\n", self.metadata.forks));

        out.push_str("## README\n\n");
        match &self.readme {
            Some(readme) => out.push_str(&format!("{}\n\n", readme)),
            None => out.push_str("No README available.\n\n"),
        }

        out.push_str("## File Tree\n\n```\n");
        for line in &self.file_tree {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("```\n\n");

        out.push_str("## Package Summary\n\n");
        match &self.package_summary {
            Some(pkg) => {
                out.push_str(&format!(
                    "- Name: {}\n",
                    pkg.name.as_deref().unwrap_or("unknown")
                ));
                out.push_str(&format!(
                    "- Version: {}\n",
                    pkg.version.as_deref().unwrap_or("unknown")
                ));
                out.push_str(&format!(
                    "- Dependencies ({}): {}\n",
                    pkg.dependencies.len(),
                    pkg.dependencies.join(", ")
                ));
                out.push_str(&format!(
                    "- Dev dependencies ({}): {}\n",
                    pkg.dev_dependencies.len(),
                    pkg.dev_dependencies.join(", ")
                ));
                out.push_str(&format!("- Scripts: {}\n\n", pkg.scripts.join(", ")));
            }
            None => out.push_str("No package.json found.\n\n"),
        }

        out.push_str("## Source Files\n\n");
        for excerpt in &self.source_excerpts {
            out.push_str(&format!("### {}\n\n```\n{}\n```\n\n", excerpt.path, excerpt.content));
        }

        out.push_str("## Configuration Files\n\n");
        for excerpt in &self.config_excerpts {
            out.push_str(&format!("### {}\n\n```\n{}\n```\n\n", excerpt.path, excerpt.content));
        }

        out
    }

    /// Dependency names joined for prompt substitution.
    pub fn dependency_list(&self) -> String {
        self.package_summary
            .as_ref()
            .map(|pkg| pkg.dependencies.join(", "))
            .unwrap_or_default()
    }
}

/// Hard-truncate a string to at most `max_chars` characters.
///
/// Deliberately not word-boundary aware: this is cost control, and the cut
/// must land on exactly `max_chars` characters (not bytes).
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
