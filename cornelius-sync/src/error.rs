//! Error types for cornelius-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise inside a pipeline's poll/transfer sequence.
///
/// Every variant is fatal to the pipeline that produced it.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A collaborator (object storage client, destination client) could not
    /// be constructed from the pipeline configuration.
    #[error("failed to initialise {collaborator} connection: {reason}")]
    ConnectionInit {
        collaborator: &'static str,
        reason: String,
    },

    #[error("destination drive {drive_id} does not exist")]
    DestinationNotFound { drive_id: String },

    #[error("destination folder {folder_id} does not exist")]
    DestinationFolderNotFound { folder_id: String },

    /// Source or destination enumeration failed.
    #[error("failed to list {what}: {reason}")]
    List { what: &'static str, reason: String },

    #[error("failed to resolve folder path for {folder_id}: {reason}")]
    Resolve { folder_id: String, reason: String },

    #[error("failed to download {key}: {reason}")]
    Download { key: String, reason: String },

    #[error("failed to upload {path}: {reason}")]
    Upload { path: PathBuf, reason: String },

    /// Distinct from [`SyncError::Upload`]: the object itself was replicated.
    #[error("failed to create manifest for folder {folder_id}: {reason}")]
    Manifest { folder_id: String, reason: String },

    #[error("unable to parse fee {value:?}: {reason}")]
    FeeParse { value: String, reason: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external command exited unsuccessfully or could not be spawned.
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// `true` for the drive/folder existence checks run before polling.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SyncError::DestinationNotFound { .. } | SyncError::DestinationFolderNotFound { .. }
        )
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
