//! # cornelius-sync
//!
//! Delta-sync engine replicating an S3-compatible bucket into an ArDrive
//! folder.
//!
//! A [`PipelineExecutor`] owns one pipeline: it checks destination
//! preconditions once, then polls both sides, computes the delta with
//! [`compute_delta`] and transfers each selected object through a
//! [`TransferOrchestrator`].

pub mod ardrive;
pub mod connector;
pub mod delta;
pub mod error;
pub mod executor;
pub mod model;
pub mod object_storage;
pub mod resolve;
pub mod transfer;

pub use ardrive::ArdriveClient;
pub use connector::{
    ConnectorFactory, Connectors, Destination, FolderInfo, LiveConnectors, ObjectSource,
};
pub use delta::{compute_delta, join_logical_path};
pub use error::SyncError;
pub use executor::{CycleSummary, PipelineExecutor, PipelineReport, PipelineState};
pub use model::{
    DestinationObject, SourceObject, StagedFile, TransferReceipt, FILE_SIZE_LIMIT,
};
pub use object_storage::S3Source;
pub use resolve::{resolve_folder_path, MAX_FOLDER_DEPTH};
pub use transfer::{TransferOrchestrator, Transferred};
