//! Add or remove a topic across the user's public repositories

use anyhow::{Context, Result};
use musikant_domain::{
    TopicMode, TopicUpdateOutcome,
    usecases::{TopicUpdater, TopicUpdaterConfig, collect_worklist},
};
use std::sync::Arc;

use crate::args::TopicsCli;
use crate::commands::{build_client, require_token};
use crate::config::AppConfig;

pub async fn execute(args: TopicsCli, config: AppConfig) -> Result<()> {
    let mode: TopicMode = args.mode.parse()?;
    let topic = args.topic.unwrap_or_else(|| config.topics.topic.clone());
    let max_workers = args.max_workers.unwrap_or_else(default_workers).max(1);

    let token = require_token(&config.github.token_env)?;
    let client = Arc::new(build_client(&config.github, Some(token))?);

    let worklist = collect_worklist(
        client.as_ref(),
        &topic,
        mode,
        config.topics.list_options(),
    )
    .await
    .context("Failed to collect repositories")?;

    let names: Vec<String> = worklist.iter().map(|repo| repo.display_name()).collect();
    tracing::info!(
        topic = %topic,
        mode = %mode,
        repos = %names.join(" "),
        "Changing the topic for the following repos"
    );

    if worklist.is_empty() {
        tracing::info!("Nothing to do");
        return Ok(());
    }

    let updater = TopicUpdater::new(
        client,
        TopicUpdaterConfig {
            topic,
            mode,
            dry_run: args.dry_run,
            max_workers,
        },
    );

    let outcomes = updater
        .run(worklist)
        .await
        .context("Topic update aborted")?;

    let failed = outcomes
        .iter()
        .filter(|(_, outcome)| matches!(outcome, TopicUpdateOutcome::Failed { .. }))
        .count();

    tracing::info!(
        repos = outcomes.len(),
        failed = failed,
        dry_run = args.dry_run,
        "Done"
    );

    Ok(())
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
