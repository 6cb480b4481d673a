//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::{RepositoryPage, WorkflowFile};

/// Error type for commit lookups
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Rate limited, gave up after waiting")]
    RateLimited,
    #[error("Missing SHA for {owner}/{repo}@{git_ref}")]
    MissingSha {
        owner: String,
        repo: String,
        git_ref: String,
    },
}

/// Port for turning a tag or branch name into a commit SHA
#[async_trait]
pub trait CommitResolver: Send + Sync {
    /// Look up the commit `git_ref` points at in `owner/repo`
    async fn resolve_commit(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<String, LookupError>;
}

/// Error type for repository host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Rate limited, gave up after waiting")]
    RateLimited,
}

/// Port for listing repositories and replacing their topics
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// List one page of public repositories owned by the authenticated user
    async fn list_repositories(&self, page: u32, per_page: u32)
    -> Result<RepositoryPage, HostError>;

    /// Replace the complete topic set; returns the set the API confirmed
    async fn replace_topics(
        &self,
        owner: &str,
        repo: &str,
        topics: &[String],
    ) -> Result<Vec<String>, HostError>;
}

/// Error type for workflow file access
#[derive(Debug, Error)]
pub enum WorkflowStoreError {
    #[error("Failed to list {}: {source}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Port for enumerating, reading and writing workflow files
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Files (not directories) directly inside the workflows directory
    async fn list(&self) -> Result<Vec<WorkflowFile>, WorkflowStoreError>;

    async fn read(&self, file: &WorkflowFile) -> Result<String, WorkflowStoreError>;

    /// Write the rewritten document to wherever this store sends output
    async fn write(&self, file: &WorkflowFile, contents: &str) -> Result<(), WorkflowStoreError>;
}
