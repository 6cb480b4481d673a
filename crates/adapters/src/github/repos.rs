//! Repository listing and topic replacement

use async_trait::async_trait;
use musikant_domain::{HostError, Repository, RepositoryHost, RepositoryPage};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{GitHubClient, GitHubError};

#[derive(Deserialize)]
struct RepositoryResponse {
    id: Option<u64>,
    name: Option<String>,
    owner: Option<OwnerResponse>,
    fork: Option<bool>,
    archived: Option<bool>,
    #[serde(default)]
    topics: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct OwnerResponse {
    login: Option<String>,
}

impl From<RepositoryResponse> for Repository {
    fn from(repo: RepositoryResponse) -> Self {
        Repository {
            id: repo.id,
            owner: repo.owner.and_then(|o| o.login),
            name: repo.name,
            fork: repo.fork,
            archived: repo.archived,
            topics: repo.topics.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct TopicsRequest<'a> {
    names: &'a [String],
}

#[derive(Deserialize)]
struct TopicsResponse {
    #[serde(default)]
    names: Vec<String>,
}

impl From<GitHubError> for HostError {
    fn from(error: GitHubError) -> Self {
        match error {
            GitHubError::Network(e) => HostError::Network(e.to_string()),
            GitHubError::RateLimited { .. } => HostError::RateLimited,
            GitHubError::Auth { message, .. } => HostError::Auth(message),
            other => HostError::Api(other.to_string()),
        }
    }
}

/// Page number of the `rel="next"` entry of a `Link` header
fn next_page(link: &str) -> Option<u32> {
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        if !parts.any(|param| param.trim() == "rel=\"next\"") {
            return None;
        }

        let url = Url::parse(target.trim_start_matches('<').trim_end_matches('>')).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn list_repositories(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<RepositoryPage, HostError> {
        let response = self
            .get(&format!(
                "/user/repos?visibility=public&affiliation=owner&per_page={}&page={}",
                per_page, page
            ))
            .await?;

        let repositories: Vec<RepositoryResponse> = serde_json::from_str(&response.body)
            .map_err(|e| HostError::from(GitHubError::Decode(e.to_string())))?;

        Ok(RepositoryPage {
            repositories: repositories.into_iter().map(Repository::from).collect(),
            next_page: response.link.as_deref().and_then(next_page),
        })
    }

    async fn replace_topics(
        &self,
        owner: &str,
        repo: &str,
        topics: &[String],
    ) -> Result<Vec<String>, HostError> {
        let response = self
            .put_json(
                &format!("/repos/{}/{}/topics", owner, repo),
                &TopicsRequest { names: topics },
            )
            .await?;

        let confirmed: TopicsResponse = serde_json::from_str(&response.body)
            .map_err(|e| HostError::from(GitHubError::Decode(e.to_string())))?;

        Ok(confirmed.names)
    }
}
