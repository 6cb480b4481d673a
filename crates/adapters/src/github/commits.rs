//! Commit lookup for pinning action references

use async_trait::async_trait;
use musikant_domain::{CommitResolver, LookupError};
use serde::Deserialize;

use super::{GitHubClient, GitHubError};

#[derive(Deserialize)]
struct CommitResponse {
    #[serde(default)]
    sha: Option<String>,
}

impl From<GitHubError> for LookupError {
    fn from(error: GitHubError) -> Self {
        match error {
            GitHubError::Network(e) => LookupError::Network(e.to_string()),
            GitHubError::RateLimited { .. } => LookupError::RateLimited,
            other => LookupError::Api(other.to_string()),
        }
    }
}

#[async_trait]
impl CommitResolver for GitHubClient {
    async fn resolve_commit(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<String, LookupError> {
        tracing::debug!(owner = %owner, repo = %repo, git_ref = %git_ref, "Looking up commit");

        let response = self
            .get(&format!("/repos/{}/{}/commits/{}", owner, repo, git_ref))
            .await?;

        let commit: CommitResponse = serde_json::from_str(&response.body)
            .map_err(|e| LookupError::from(GitHubError::Decode(e.to_string())))?;

        commit
            .sha
            .filter(|sha| !sha.is_empty())
            .ok_or_else(|| LookupError::MissingSha {
                owner: owner.to_string(),
                repo: repo.to_string(),
                git_ref: git_ref.to_string(),
            })
    }
}
