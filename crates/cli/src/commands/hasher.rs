//! Pin workflow action references to commit SHAs

use anyhow::{Context, Result};
use musikant_adapters::workflows::FsWorkflowStore;
use musikant_domain::usecases::PinWorkflows;
use std::sync::Arc;

use crate::args::HasherCli;
use crate::commands::{build_client, load_token};
use crate::config::AppConfig;

pub async fn execute(args: HasherCli, config: AppConfig) -> Result<()> {
    let token = load_token(&config.github.token_env);
    if token.is_none() {
        tracing::warn!(
            token_env = %config.github.token_env,
            "No GitHub token found, using unauthenticated requests"
        );
    }

    let client = Arc::new(build_client(&config.github, token)?);
    let store = Arc::new(if args.overwrite_files {
        FsWorkflowStore::overwrite(&args.workflows_directory)
    } else {
        FsWorkflowStore::to_stdout(&args.workflows_directory)
    });

    tracing::info!(
        directory = %args.workflows_directory.display(),
        overwrite = args.overwrite_files,
        authenticated = client.is_authenticated(),
        "Pinning workflow references"
    );

    let reports = PinWorkflows::new(client, store)
        .run()
        .await
        .with_context(|| {
            format!(
                "Failed to pin workflows in {}",
                args.workflows_directory.display()
            )
        })?;

    let written = reports.iter().filter(|r| r.written).count();
    let replaced: usize = reports.iter().map(|r| r.replaced.len()).sum();
    let failed: usize = reports.iter().map(|r| r.failed.len()).sum();

    tracing::info!(
        files = reports.len(),
        written = written,
        replaced = replaced,
        failed = failed,
        "Done"
    );

    Ok(())
}
