//! Pin workflows use case - replace tagged action references with commit SHAs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    model::{ActionReference, FileReport, ResolvedReference, WorkflowFile},
    ports::{CommitResolver, LookupError, WorkflowStore, WorkflowStoreError},
    reference::ParseError,
    workflow::WorkflowDocument,
};

/// Why a single `uses` value was left untouched
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Error getting commit: {0}")]
    Lookup(#[from] LookupError),
}

/// Errors that stop the whole run
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("Error reading directory: {0}")]
    Enumeration(#[source] WorkflowStoreError),
    #[error("Error reading file: {0}")]
    Read(#[source] WorkflowStoreError),
    #[error("Error parsing YAML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Error marshaling modified YAML for {}: {source}", path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Error writing modified file: {0}")]
    Write(#[source] WorkflowStoreError),
}

/// Rewrites every workflow file in a store, one file at a time
pub struct PinWorkflows<R, W>
where
    R: CommitResolver + ?Sized,
    W: WorkflowStore + ?Sized,
{
    resolver: Arc<R>,
    store: Arc<W>,
}

impl<R, W> PinWorkflows<R, W>
where
    R: CommitResolver + ?Sized,
    W: WorkflowStore + ?Sized,
{
    pub fn new(resolver: Arc<R>, store: Arc<W>) -> Self {
        Self { resolver, store }
    }

    /// Resolve a tagged reference to the commit it currently points at
    pub async fn resolve(
        &self,
        reference: ActionReference,
    ) -> Result<ResolvedReference, LookupError> {
        let sha = self
            .resolver
            .resolve_commit(&reference.owner, &reference.repo, &reference.git_ref)
            .await?;

        if sha.trim().is_empty() {
            return Err(LookupError::MissingSha {
                owner: reference.owner,
                repo: reference.repo,
                git_ref: reference.git_ref,
            });
        }

        Ok(ResolvedReference { reference, sha })
    }

    /// Compute the pinned `uses` value for a raw one
    pub async fn replacement_for(&self, uses: &str) -> Result<String, ReferenceError> {
        let reference = ActionReference::parse(uses)?;
        let resolved = self.resolve(reference).await?;
        Ok(resolved.pinned())
    }

    /// Process every workflow file. Stops at the first file that cannot be
    /// read, parsed or written.
    pub async fn run(&self) -> Result<Vec<FileReport>, PinError> {
        let files = self.store.list().await.map_err(PinError::Enumeration)?;
        let mut resolved: HashMap<String, String> = HashMap::new();
        let mut reports = Vec::with_capacity(files.len());

        for file in files {
            tracing::info!(file = %file.path.display(), "Processing workflow");
            let report = self.process_file(&file, &mut resolved).await?;
            reports.push(report);
        }

        Ok(reports)
    }

    async fn process_file(
        &self,
        file: &WorkflowFile,
        resolved: &mut HashMap<String, String>,
    ) -> Result<FileReport, PinError> {
        let source = self.store.read(file).await.map_err(PinError::Read)?;
        let mut document = WorkflowDocument::parse(source).map_err(|source| PinError::Parse {
            path: file.path.clone(),
            source,
        })?;

        let mut report = FileReport {
            path: file.path.clone(),
            ..Default::default()
        };

        for uses in document.uses_values() {
            if resolved.contains_key(&uses) || report.failed.contains(&uses) {
                continue;
            }

            match self.replacement_for(&uses).await {
                Ok(pinned) => {
                    tracing::debug!(uses = %uses, pinned = %pinned, "Resolved reference");
                    resolved.insert(uses, pinned);
                }
                Err(ReferenceError::Parse(e)) => {
                    tracing::debug!(file = %file.path.display(), error = %e, "Skipping uses value");
                }
                Err(e @ ReferenceError::Lookup(_)) => {
                    tracing::warn!(
                        file = %file.path.display(),
                        uses = %uses,
                        error = %e,
                        "Keeping original reference"
                    );
                    report.failed.push(uses);
                }
            }
        }

        let replaced = &mut report.replaced;
        let modified = document.rewrite_uses(&mut |uses| match resolved.get(uses) {
            Some(pinned) => {
                if !replaced.iter().any(|(from, _)| from == uses) {
                    replaced.push((uses.to_string(), pinned.clone()));
                }
                pinned.clone()
            }
            None => uses.to_string(),
        });

        if !modified {
            tracing::debug!(file = %file.path.display(), "No tagged references to pin");
            return Ok(report);
        }

        let rendered = document.render().map_err(|source| PinError::Render {
            path: file.path.clone(),
            source,
        })?;

        self.store
            .write(file, &rendered)
            .await
            .map_err(PinError::Write)?;
        report.written = true;

        tracing::info!(
            file = %file.path.display(),
            replaced = report.replaced.len(),
            "Pinned workflow"
        );

        Ok(report)
    }
}
