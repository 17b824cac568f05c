//! Binary crate for the `dewy` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and validating ZIP codes
//! - Interactive configuration and permission prompts
//! - Rendering weather state as it changes

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod render;
mod terminal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
