//! Command-line definition and dispatch.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use spindle_common::config::InjectorConfig;
use spindle_common::constants::DEFAULT_LOG_FILTER;
use spindle_core::Injector;
use spindle_demo::graph::{self, Root};
use spindle_demo::report;
use tracing_subscriber::EnvFilter;

/// Spindle — wires the example object graph and prints it.
#[derive(Parser, Debug)]
#[command(name = "spindle", version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON injector configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// `tracing` filter directive; overrides `RUST_LOG`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

/// How the resolved graph is printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// The rendered root only.
    Text,
    /// A JSON report.
    Json,
}

/// Builds the log filter from `--log-level`, then `RUST_LOG`, then the
/// built-in default.
///
/// # Errors
///
/// Returns an error if `--log-level` is not a valid filter directive.
pub fn log_filter(cli: &Cli) -> anyhow::Result<EnvFilter> {
    match &cli.log_level {
        Some(directive) => Ok(EnvFilter::try_new(directive)?),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
    }
}

/// Builds the injector, resolves the root, and prints the result.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the graph
/// fails to resolve.
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => InjectorConfig::load(path)?,
        None => InjectorConfig::default(),
    };
    tracing::info!(label = %config.label, max_depth = ?config.max_depth, "building injector");

    let injector = Injector::builder().config(config).build()?;
    graph::register(&injector)?;

    let root = injector.get_instance::<Root>()?;
    tracing::info!(injector = %injector.id(), "graph resolved");

    match cli.format {
        Format::Text => println!("{root}"),
        Format::Json => {
            let report = report::inspect(&injector, &root)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
