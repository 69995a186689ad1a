use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Limits and switches for one runtime connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum number of values on the host-visible value stack.
    pub max_stack_size: usize,
    /// Maximum nesting of script function calls.
    pub max_call_depth: usize,
    /// Largest string concatenation may build, in bytes.
    pub max_string_bytes: usize,
    /// Install the base library (`print`, `pcall`, `setmetatable`, ...).
    pub open_libs: bool,
    /// Collect `print` output in a buffer instead of writing to stdout.
    pub capture_output: bool,
    /// Reuse parsed chunks for repeated sources.
    pub cache_chunks: bool,
}

pub const MIN_STACK_SIZE: usize = 20;

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_stack_size: 8000,
            max_call_depth: 200,
            max_string_bytes: 16 * 1024 * 1024,
            open_libs: true,
            capture_output: false,
            cache_chunks: true,
        }
    }
}

/// A connection could not be created.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RuntimeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SetupError> {
        let config: RuntimeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SetupError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.max_stack_size < MIN_STACK_SIZE {
            return Err(SetupError::InvalidConfig(format!(
                "max_stack_size must be at least {}, got {}",
                MIN_STACK_SIZE, self.max_stack_size
            )));
        }
        if self.max_call_depth == 0 {
            return Err(SetupError::InvalidConfig(String::from(
                "max_call_depth must be at least 1",
            )));
        }
        if self.max_string_bytes == 0 {
            return Err(SetupError::InvalidConfig(String::from(
                "max_string_bytes must be at least 1",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = RuntimeConfig::from_json_str(r#"{ "max_call_depth": 50 }"#).unwrap();
        assert_eq!(config.max_call_depth, 50);
        assert_eq!(config.max_stack_size, 8000);
        assert!(config.open_libs);
    }

    #[test]
    fn test_rejects_tiny_stack() {
        let err = RuntimeConfig::from_json_str(r#"{ "max_stack_size": 3 }"#).unwrap_err();
        assert!(err.to_string().contains("max_stack_size"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = RuntimeConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, SetupError::Parse(_)));
    }
}
