//! Command implementations behind the two binaries

pub mod hasher;
pub mod topics;

use anyhow::{Context, Result, bail};
use musikant_adapters::GitHubClient;
use secrecy::SecretString;

use crate::config::GitHubConfig;

/// Read the GitHub token from `env_var`; unset or blank yields `None`
pub(crate) fn load_token(env_var: &str) -> Option<SecretString> {
    if env_var.trim().is_empty() {
        return None;
    }

    std::env::var(env_var)
        .ok()
        .filter(|token| !token.trim().is_empty())
        .map(|token| SecretString::new(token.into()))
}

/// Like [`load_token`] but a missing token is an error
pub(crate) fn require_token(env_var: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No GitHub token env var configured (github.token_env)");
    }

    load_token(env_var)
        .with_context(|| format!("Missing or empty GitHub token in env var {}", env_var))
}

pub(crate) fn build_client(
    config: &GitHubConfig,
    token: Option<SecretString>,
) -> Result<GitHubClient> {
    GitHubClient::with_config(token, config.client_config())
        .context("Failed to initialize GitHub client")
}
