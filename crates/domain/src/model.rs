//! Domain models and value objects

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A reusable action pinned to a version tag, e.g. `actions/checkout@v4`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionReference {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Tag the reference currently points at (always starts with `v`)
    pub git_ref: String,
}

impl fmt::Display for ActionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.git_ref)
    }
}

/// An action reference together with the commit its tag resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub reference: ActionReference,
    /// Commit SHA as reported by the API
    pub sha: String,
}

impl ResolvedReference {
    /// The `uses` value that replaces the tagged one
    pub fn pinned(&self) -> String {
        format!(
            "{}/{}@{}",
            self.reference.owner, self.reference.repo, self.sha
        )
    }
}

/// A workflow file discovered in the target directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFile {
    /// File name without directory
    pub name: String,
    /// Full path to the file
    pub path: PathBuf,
}

/// Outcome of processing one workflow file
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: PathBuf,
    /// `(original, replacement)` pairs that were rewritten
    pub replaced: Vec<(String, String)>,
    /// `uses` values that looked like tags but could not be resolved
    pub failed: Vec<String>,
    /// Whether the document was written out
    pub written: bool,
}

/// A repository as listed by the hosting API
///
/// Identity fields and flags are optional because the API is free to omit
/// them; consumers decide how to treat missing values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    pub id: Option<u64>,
    /// Login of the owning account
    pub owner: Option<String>,
    pub name: Option<String>,
    pub fork: Option<bool>,
    pub archived: Option<bool>,
    /// Topics in the order reported by the API
    pub topics: Vec<String>,
}

impl Repository {
    /// Only repositories explicitly marked as neither fork nor archived qualify
    pub fn is_eligible(&self) -> bool {
        self.fork == Some(false) && self.archived == Some(false)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }

    /// Name for log output; falls back to the numeric ID
    pub fn display_name(&self) -> String {
        match (&self.name, self.id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => format!("#{}", id),
            (None, None) => "<unnamed>".to_string(),
        }
    }
}

/// One page of a repository listing
#[derive(Debug, Clone, Default)]
pub struct RepositoryPage {
    pub repositories: Vec<Repository>,
    /// Page number to request next, `None` on the last page
    pub next_page: Option<u32>,
}

/// Whether the topic gets added to or removed from repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicMode {
    #[default]
    Add,
    Remove,
}

impl TopicMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicMode::Add => "add",
            TopicMode::Remove => "remove",
        }
    }
}

impl fmt::Display for TopicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown topic mode
#[derive(Debug, thiserror::Error)]
#[error("Unknown mode '{0}': expected \"add\" or \"remove\"")]
pub struct ModeError(pub String);

impl FromStr for TopicMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "add" => Ok(TopicMode::Add),
            "remove" => Ok(TopicMode::Remove),
            other => Err(ModeError(other.to_string())),
        }
    }
}

/// Result of updating the topics of a single repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicUpdateOutcome {
    /// The API confirmed the new topic set
    Updated { topics: Vec<String> },
    /// Dry run, nothing was sent
    DryRun { topics: Vec<String> },
    /// The replace call failed
    Failed { error: String },
}
