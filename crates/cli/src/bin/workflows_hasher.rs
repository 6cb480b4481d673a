//! workflows-hasher entry point

use anyhow::Result;
use clap::Parser;
use musikant_cli::{args::HasherCli, commands, config::AppConfig, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = HasherCli::parse();
    let config = AppConfig::load(cli.common.config.as_deref())?;

    let log_level = cli
        .common
        .log_level
        .as_deref()
        .unwrap_or(&config.general.log_level);
    init_logging(log_level)?;

    commands::hasher::execute(cli, config).await
}
