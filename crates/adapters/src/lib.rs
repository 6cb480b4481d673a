//! musikant adapters crate
//!
//! Infrastructure adapters implementing the domain ports:
//! - `github`: GitHub REST client (commit lookup, repository listing, topics)
//! - `workflows`: filesystem workflow store

pub mod github;
mod workflows_fs;

pub use github::{GitHubClient, GitHubClientConfig, GitHubError};

/// Re-exports for workflow storage adapters
pub mod workflows {
    pub use crate::workflows_fs::FsWorkflowStore;
}
