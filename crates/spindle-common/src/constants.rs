//! Workspace-wide constants.

/// Default label attached to an injector's log records.
pub const DEFAULT_LABEL: &str = "spindle";

/// Default `tracing` filter directive for the CLI.
pub const DEFAULT_LOG_FILTER: &str = "warn";
