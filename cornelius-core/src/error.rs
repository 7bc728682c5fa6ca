//! Error types for cornelius-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML error for in-memory documents (no file path available).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A duration string such as `frequency: 30m` could not be parsed.
    #[error("invalid duration {input:?}: {reason}")]
    Duration { input: String, reason: String },

    /// The document parsed but violates a structural rule.
    #[error("invalid config: {0}")]
    Invalid(String),
}
