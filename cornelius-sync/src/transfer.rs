//! Single-object transfer: download, upload, optional manifest, cleanup.
//!
//! ## `transfer` protocol
//!
//! 1. Download the object into the pipeline's staging directory.
//! 2. Upload the staged file under the pipeline's parent folder.
//! 3. If manifests are enabled and the file is `index.html`, create a
//!    manifest for the folder the new entity landed in.
//! 4. Sum the receipt's fees.
//! 5. Remove the staged file on every exit path; a failed removal is logged.

use std::io::ErrorKind;

use crate::connector::{Destination, ObjectSource};
use crate::error::SyncError;
use crate::model::{SourceObject, StagedFile, TransferReceipt};

/// Outcome of one successful transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferred {
    pub receipt: TransferReceipt,
    pub total_fees: u64,
    /// Folder a manifest was created for, if any.
    pub manifest_folder: Option<String>,
}

/// Moves one object from source to destination for a single pipeline.
pub struct TransferOrchestrator<'a> {
    source: &'a dyn ObjectSource,
    destination: &'a dyn Destination,
    parent_folder_id: &'a str,
    enable_manifest: bool,
}

impl<'a> TransferOrchestrator<'a> {
    pub fn new(
        source: &'a dyn ObjectSource,
        destination: &'a dyn Destination,
        parent_folder_id: &'a str,
        enable_manifest: bool,
    ) -> Self {
        Self {
            source,
            destination,
            parent_folder_id,
            enable_manifest,
        }
    }

    pub async fn transfer(&self, object: &SourceObject) -> Result<Transferred, SyncError> {
        tracing::debug!(object = %object.key, "downloading from object storage");
        let staged = self.source.download(object).await?;
        tracing::debug!(object = %object.key, path = %staged.path.display(), "staged");

        let outcome = self.upload_staged(object, &staged).await;
        remove_staged(&staged).await;
        outcome
    }

    async fn upload_staged(
        &self,
        object: &SourceObject,
        staged: &StagedFile,
    ) -> Result<Transferred, SyncError> {
        let content_type = staged
            .content_type
            .as_deref()
            .or(object.content_type.as_deref())
            .filter(|ct| !ct.is_empty());

        let receipt = self
            .destination
            .upload(staged, self.parent_folder_id, content_type)
            .await?;

        let manifest_folder = if should_create_manifest(self.enable_manifest, staged) {
            Some(self.create_manifest(&receipt).await?)
        } else {
            None
        };

        let total_fees = receipt.total_fees()?;
        Ok(Transferred {
            receipt,
            total_fees,
            manifest_folder,
        })
    }

    async fn create_manifest(&self, receipt: &TransferReceipt) -> Result<String, SyncError> {
        let Some(entity_id) = receipt.entity_id() else {
            return Err(SyncError::Manifest {
                folder_id: self.parent_folder_id.to_string(),
                reason: "upload receipt names no created entity".into(),
            });
        };

        let folder_id = self
            .destination
            .parent_folder_of(entity_id)
            .await
            .map_err(|e| SyncError::Manifest {
                folder_id: self.parent_folder_id.to_string(),
                reason: format!("unable to look up parent of {entity_id}: {e}"),
            })?;

        tracing::info!(parent_id = %folder_id, index_entity_id = %entity_id, "creating manifest");
        self.destination
            .create_manifest(&folder_id)
            .await
            .map_err(|e| match e {
                SyncError::Manifest { .. } => e,
                other => SyncError::Manifest {
                    folder_id: folder_id.clone(),
                    reason: other.to_string(),
                },
            })?;
        Ok(folder_id)
    }
}

/// Manifests are generated only for `index.html` and only when enabled.
pub fn should_create_manifest(enable_manifest: bool, staged: &StagedFile) -> bool {
    enable_manifest && staged.is_manifest_index()
}

async fn remove_staged(staged: &StagedFile) {
    tracing::debug!(path = %staged.path.display(), "removing staged file");
    match tokio::fs::remove_file(&staged.path).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %staged.path.display(), error = %err, "failed to remove staged file");
        }
    }
}
