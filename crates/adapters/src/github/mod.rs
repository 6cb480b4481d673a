//! GitHub REST API adapter
//!
//! One client serves both tools: it resolves commits for workflow pinning
//! and lists repositories / replaces topics for the topic manager. Requests
//! wait out rate limits, and GET responses go through a bounded LRU cache.

mod cache;
mod commits;
mod rate_limit;
mod repos;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;

use cache::ResponseCache;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Tunables for the GitHub client
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Maximum cached GET responses, 0 disables the cache
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    /// How many times a rate-limited request is retried
    pub max_retries: u32,
    /// Longest single wait for a rate limit reset
    pub max_wait: Duration,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            user_agent: "musikant".to_string(),
            timeout: Duration::from_secs(30),
            cache_capacity: 1000,
            cache_ttl: Duration::from_secs(3600),
            max_retries: 3,
            max_wait: Duration::from_secs(3600),
        }
    }
}

/// Errors raised by the HTTP layer before they are mapped onto port errors
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Rate limited, gave up after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },
    #[error("GitHub API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Body and paging information of a successful response
#[derive(Debug, Clone)]
pub(crate) struct ApiResponse {
    pub body: String,
    pub link: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// GitHub REST client with rate-limit waiting and response caching
pub struct GitHubClient {
    client: Client,
    token: Option<SecretString>,
    config: GitHubClientConfig,
    cache: ResponseCache,
}

impl GitHubClient {
    pub fn with_config(
        token: Option<SecretString>,
        config: GitHubClientConfig,
    ) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(GitHubError::Client)?;

        let cache = ResponseCache::new(config.cache_capacity, config.cache_ttl);
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            token,
            config: GitHubClientConfig { base_url, ..config },
            cache,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }

    /// Send a request, sleeping through rate limits until it goes through or
    /// the retry budget is spent
    async fn execute<F>(&self, build: F) -> Result<Response, GitHubError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            let response = self
                .authorize(build())
                .send()
                .await
                .map_err(GitHubError::Network)?;

            let now = OffsetDateTime::now_utc().unix_timestamp();
            let Some(delay) = rate_limit::retry_delay(response.status(), response.headers(), now)
            else {
                return Ok(response);
            };

            if attempt >= self.config.max_retries || delay > self.config.max_wait {
                return Err(GitHubError::RateLimited {
                    attempts: attempt + 1,
                });
            }

            attempt += 1;
            tracing::warn!(
                url = %response.url(),
                wait_secs = delay.as_secs(),
                attempt = attempt,
                "Rate limited by GitHub, waiting for reset"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// GET through the response cache
    pub(crate) async fn get(&self, path: &str) -> Result<ApiResponse, GitHubError> {
        let url = self.url(path);
        let cached = self.cache.get(&url);

        if let Some(entry) = &cached {
            if self.cache.is_fresh(entry) {
                tracing::trace!(url = %url, "Serving cached response");
                return Ok(entry.response.clone());
            }
        }

        let etag = cached.as_ref().and_then(|entry| entry.etag.clone());
        let response = self
            .execute(|| {
                let request = self.client.get(&url);
                match &etag {
                    Some(tag) => request.header(header::IF_NONE_MATCH, tag),
                    None => request,
                }
            })
            .await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            if let Some(entry) = cached {
                tracing::trace!(url = %url, "Cached response revalidated");
                self.cache.touch(&url);
                return Ok(entry.response);
            }
        }

        let response = check_status(response).await?;
        let etag = header_string(response.headers(), header::ETAG);
        let link = header_string(response.headers(), header::LINK);
        let body = response.text().await.map_err(GitHubError::Network)?;

        let api_response = ApiResponse { body, link };
        self.cache.insert(&url, api_response.clone(), etag);
        Ok(api_response)
    }

    /// PUT a JSON body; never cached
    pub(crate) async fn put_json<B>(&self, path: &str, body: &B) -> Result<ApiResponse, GitHubError>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path);
        let response = self.execute(|| self.client.put(&url).json(body)).await?;
        let response = check_status(response).await?;
        let link = header_string(response.headers(), header::LINK);
        let body = response.text().await.map_err(GitHubError::Network)?;
        Ok(ApiResponse { body, link })
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn check_status(response: Response) -> Result<Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(body);

    if status == StatusCode::UNAUTHORIZED {
        return Err(GitHubError::Auth {
            status: status.as_u16(),
            message,
        });
    }

    Err(GitHubError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Client pointed at a mock server with immediate rate-limit retries
    pub fn client_for(base_url: String, cache_capacity: usize) -> GitHubClient {
        GitHubClient::with_config(
            Some(SecretString::new("test-token".into())),
            GitHubClientConfig {
                base_url,
                cache_capacity,
                max_retries: 2,
                max_wait: Duration::from_secs(5),
                ..Default::default()
            },
        )
        .unwrap()
    }
}
