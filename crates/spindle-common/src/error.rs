//! Unified error type for the Spindle workspace.
//!
//! Every failure is fatal to the current request: the container performs
//! no internal recovery and returns these variants unchanged to the
//! caller of `get_instance` or `register_*`.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Qualifier, TypeKey};

/// Boxed error returned by user constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which lookup table produced an ambiguous qualifier match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguitySource {
    /// Two tags matched distinct qualified instances.
    Instances,
    /// Two tags matched distinct concrete bindings.
    Bindings,
}

impl std::fmt::Display for AmbiguitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instances => write!(f, "instances"),
            Self::Bindings => write!(f, "bindings"),
        }
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum InjectError {
    /// A type registered without an explicit tag carries no qualifier.
    #[error("{concrete} carries no qualifier tag")]
    MissingQualifier {
        /// Concrete type that was being registered.
        concrete: TypeKey,
    },

    /// A binding already exists for the contract and qualifier.
    #[error("duplicate binding {qualifier} for contract {contract}")]
    DuplicateBinding {
        /// Contract type of the binding.
        contract: TypeKey,
        /// Qualifier slot that was already bound.
        qualifier: Qualifier,
    },

    /// A qualified instance already exists for the contract and qualifier.
    #[error("duplicate qualified instance {qualifier} for contract {contract}")]
    DuplicateQualifiedInstance {
        /// Contract type of the instance.
        contract: TypeKey,
        /// Qualifier slot that was already populated.
        qualifier: Qualifier,
    },

    /// An unqualified singleton already exists for the type.
    #[error("duplicate singleton instance for {key}")]
    DuplicateSingleton {
        /// Type whose slot was already populated.
        key: TypeKey,
    },

    /// No constructor is eligible for injection.
    #[error("no eligible constructor for {concrete}")]
    NoEligibleConstructor {
        /// Type that could not be instantiated.
        concrete: TypeKey,
    },

    /// More than one constructor is eligible for injection.
    #[error("{count} eligible constructors for {concrete}, expected exactly one")]
    AmbiguousConstructor {
        /// Type with several eligible constructors.
        concrete: TypeKey,
        /// Number of eligible constructors found.
        count: usize,
    },

    /// A parameter or field resolved to no value.
    #[error("missing dependency `{point}` of {owner}")]
    MissingDependency {
        /// Name of the parameter or field.
        point: &'static str,
        /// Type declaring the injection point.
        owner: TypeKey,
    },

    /// Several qualifiers at one injection point resolved to distinct targets.
    #[error("ambiguous qualified {source_kind} for {target} at `{point}` of {owner}")]
    AmbiguousQualifier {
        /// Requested type.
        target: TypeKey,
        /// Name of the parameter or field.
        point: &'static str,
        /// Type declaring the injection point.
        owner: TypeKey,
        /// Table where the conflict was found.
        source_kind: AmbiguitySource,
    },

    /// The constructor itself returned an error.
    #[error("failed to construct {concrete}: {source}")]
    ConstructionFailed {
        /// Type being constructed.
        concrete: TypeKey,
        /// Error raised by the constructor.
        source: BoxError,
    },

    /// Nested construction exceeded the configured depth limit.
    #[error("resolution depth limit {limit} exceeded while constructing {concrete}")]
    DepthExceeded {
        /// Configured limit.
        limit: usize,
        /// Type whose construction crossed the limit.
        concrete: TypeKey,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, InjectError>;
