//! CLI argument definitions

use clap::{Args, Parser};
use std::path::PathBuf;

/// Options shared by both binaries
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// workflows-hasher: pin `uses: owner/repo@vTAG` references to commit SHAs
#[derive(Parser, Debug)]
#[command(name = "workflows-hasher")]
#[command(author, version, about, long_about = None)]
pub struct HasherCli {
    /// Directory containing the workflow files
    #[arg(long)]
    pub workflows_directory: PathBuf,

    /// Rewrite files in place instead of printing them to stdout
    #[arg(long)]
    pub overwrite_files: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// musikant: add or remove a topic across your public repositories
#[derive(Parser, Debug)]
#[command(name = "musikant")]
#[command(author, version, about, long_about = None)]
pub struct TopicsCli {
    /// Whether to add or remove the topic (add, remove)
    #[arg(long, default_value = "add")]
    pub mode: String,

    /// Log the new topic sets without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Number of concurrent workers (defaults to the CPU count)
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Topic to add or remove (overrides `topics.topic`)
    #[arg(long)]
    pub topic: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}
