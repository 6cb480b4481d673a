//! Parsing of `owner/repo@vTAG` action references

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::model::ActionReference;

static USES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_.-]+)/([a-zA-Z0-9_.-]+)@(v[a-zA-Z0-9_.-]+)$").expect("Valid regex")
});

/// The value is not a tag-pinned reference to a GitHub-hosted action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not a tagged action reference: '{0}'")]
pub struct ParseError(pub String);

impl ActionReference {
    /// Parse a `uses` value of the form `owner/repo@vTAG`
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let captures = USES_PATTERN
            .captures(raw)
            .ok_or_else(|| ParseError(raw.to_string()))?;

        Ok(Self {
            owner: captures[1].to_string(),
            repo: captures[2].to_string(),
            git_ref: captures[3].to_string(),
        })
    }
}
