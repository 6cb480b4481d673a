//! Shared pieces of the `musikant` and `workflows-hasher` binaries

pub mod args;
pub mod commands;
pub mod config;
pub mod logging;
