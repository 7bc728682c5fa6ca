use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the scheduler and process runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] cornelius_core::ConfigError),

    #[error("sync error: {0}")]
    Sync(#[from] cornelius_sync::SyncError),

    /// A pipeline task ended with an error; siblings were left running.
    #[error("pipeline {pipeline} failed: {source}")]
    PipelineFailed {
        pipeline: String,
        #[source]
        source: cornelius_sync::SyncError,
    },

    /// A pipeline task panicked or was aborted.
    #[error("pipeline {pipeline} task join failure: {reason}")]
    Join { pipeline: String, reason: String },
}

impl DaemonError {
    /// Name of the pipeline this error belongs to, if any.
    pub fn pipeline(&self) -> Option<&str> {
        match self {
            DaemonError::PipelineFailed { pipeline, .. } | DaemonError::Join { pipeline, .. } => {
                Some(pipeline)
            }
            _ => None,
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
