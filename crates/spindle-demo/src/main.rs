//! # spindle — demo CLI
//!
//! Resolves the example object graph with a fresh injector and prints it.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod cli;

use clap::Parser;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli::log_filter(&cli)?)
        .with_writer(std::io::stderr)
        .init();

    cli::execute(&cli)
}
