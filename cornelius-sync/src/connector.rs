//! Collaborator seams between the sync engine and the outside world.
//!
//! The engine only ever talks to an [`ObjectSource`] and a [`Destination`].
//! Live implementations wrap S3-compatible storage and the ArDrive CLI;
//! tests substitute in-memory fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use cornelius_core::PipelineConfig;

use crate::ardrive::ArdriveClient;
use crate::error::SyncError;
use crate::model::{DestinationObject, SourceObject, StagedFile, TransferReceipt};
use crate::object_storage::S3Source;

/// Read side: the bucket being replicated.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Enumerate transferable objects. Zero-byte and oversized objects are
    /// excluded and epoch timestamps are replaced with the current time.
    async fn list(&self) -> Result<Vec<SourceObject>, SyncError>;

    /// Download `object` into this pipeline's staging directory.
    async fn download(&self, object: &SourceObject) -> Result<StagedFile, SyncError>;
}

/// One step of a parent-folder walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub name: String,
    pub parent_id: Option<String>,
    /// Set when the folder is the root folder of its drive.
    pub is_root: bool,
}

/// Write side: the content-addressed drive objects are replicated into.
#[async_trait]
pub trait Destination: Send + Sync {
    async fn drive_exists(&self, drive_id: &str) -> Result<bool, SyncError>;

    async fn folder_info(&self, folder_id: &str) -> Result<FolderInfo, SyncError>;

    /// Files below `parent_folder_id`, keyed by absolute logical path.
    async fn list_files(&self, parent_folder_id: &str)
        -> Result<Vec<DestinationObject>, SyncError>;

    async fn upload(
        &self,
        staged: &StagedFile,
        parent_folder_id: &str,
        content_type: Option<&str>,
    ) -> Result<TransferReceipt, SyncError>;

    /// Parent folder id of an already uploaded entity.
    async fn parent_folder_of(&self, entity_id: &str) -> Result<String, SyncError>;

    async fn create_manifest(&self, folder_id: &str) -> Result<(), SyncError>;
}

/// The collaborator pair owned by one pipeline.
pub struct Connectors {
    pub source: Box<dyn ObjectSource>,
    pub destination: Box<dyn Destination>,
}

/// Builds a pipeline's collaborators inside that pipeline's task.
pub trait ConnectorFactory: Send + Sync {
    fn connect(
        &self,
        pipeline: &PipelineConfig,
        staging_dir: &Path,
    ) -> Result<Connectors, SyncError>;
}

/// Production factory: S3-compatible source, ArDrive CLI destination.
#[derive(Debug, Clone)]
pub struct LiveConnectors {
    ardrive_cli: PathBuf,
}

impl LiveConnectors {
    pub fn new(ardrive_cli: impl Into<PathBuf>) -> Self {
        Self {
            ardrive_cli: ardrive_cli.into(),
        }
    }
}

impl ConnectorFactory for LiveConnectors {
    fn connect(
        &self,
        pipeline: &PipelineConfig,
        staging_dir: &Path,
    ) -> Result<Connectors, SyncError> {
        let source = S3Source::connect(&pipeline.bucket, staging_dir)?;
        let destination = ArdriveClient::new(&self.ardrive_cli, &pipeline.drive)?;
        Ok(Connectors {
            source: Box::new(source),
            destination: Box::new(destination),
        })
    }
}
