//! Configuration model for an injector.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InjectError, Result};

/// Settings applied to one injector for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    /// Label attached to every log record emitted by the injector.
    pub label: String,
    /// Maximum nesting of constructions within one request.
    ///
    /// `None` leaves recursion unbounded.
    pub max_depth: Option<usize>,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            label: crate::constants::DEFAULT_LABEL.to_string(),
            max_depth: None,
        }
    }
}

impl InjectorConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON,
    /// or fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| InjectError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configured values are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is blank or `max_depth` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(InjectError::Config {
                message: "label must not be empty".into(),
            });
        }
        if self.max_depth == Some(0) {
            return Err(InjectError::Config {
                message: "max_depth must be at least 1".into(),
            });
        }
        Ok(())
    }
}
