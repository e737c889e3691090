//! GitHub REST access and snapshot extraction

pub mod client;
pub mod extractor;

pub use client::{DirEntry, GithubClient, GithubError, RepoInfo};
pub use extractor::{ExtractError, Extraction, SnapshotExtractor};
