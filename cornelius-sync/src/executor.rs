//! Lifecycle of one replication pipeline.
//!
//! ```text
//! Initializing -> CheckingPreconditions -> Polling -> Transferring -> Sleeping -> Polling ...
//!                                                                  \-> Terminated
//! any state -> Failed
//! ```
//!
//! Preconditions run once per pipeline lifetime. Transfers within a cycle are
//! strictly sequential and the first failure ends the pipeline.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use cornelius_core::{PipelineConfig, PipelineName};

use crate::connector::{ConnectorFactory, Connectors};
use crate::delta::compute_delta;
use crate::error::SyncError;
use crate::resolve::resolve_folder_path;
use crate::transfer::TransferOrchestrator;

/// Lifecycle states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Initializing,
    CheckingPreconditions,
    Polling,
    Transferring,
    Sleeping,
    Terminated,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Initializing => "initializing",
            PipelineState::CheckingPreconditions => "checking_preconditions",
            PipelineState::Polling => "polling",
            PipelineState::Transferring => "transferring",
            PipelineState::Sleeping => "sleeping",
            PipelineState::Terminated => "terminated",
            PipelineState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Summary of a pipeline that terminated without error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub pipeline: String,
    /// Completed poll/transfer cycles.
    pub cycles: u64,
    pub transferred: u64,
    pub fees_paid: u64,
    /// Stopped by the external cancellation signal rather than single shot.
    pub cancelled: bool,
}

/// Counts for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub source_count: usize,
    pub destination_count: usize,
    pub delta_count: usize,
    pub transferred: u64,
    pub fees_paid: u64,
    pub cancelled: bool,
}

/// Owns one pipeline: its collaborators, staging directory and poll state.
pub struct PipelineExecutor {
    config: PipelineConfig,
    staging_dir: PathBuf,
    factory: Arc<dyn ConnectorFactory>,
    cancel: CancellationToken,
    state: PipelineState,
}

impl PipelineExecutor {
    pub fn new(
        config: PipelineConfig,
        staging_dir: PathBuf,
        factory: Arc<dyn ConnectorFactory>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            staging_dir,
            factory,
            cancel,
            state: PipelineState::Initializing,
        }
    }

    pub fn name(&self) -> &PipelineName {
        &self.config.name
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run until single-shot completion, cancellation, or the first error.
    pub async fn run(mut self) -> Result<PipelineReport, SyncError> {
        match self.run_inner().await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.transition(PipelineState::Failed);
                tracing::error!(error = %err, "pipeline failed");
                Err(err)
            }
        }
    }

    async fn run_inner(&mut self) -> Result<PipelineReport, SyncError> {
        self.transition(PipelineState::Initializing);
        let connectors = self.factory.connect(&self.config, &self.staging_dir)?;

        self.transition(PipelineState::CheckingPreconditions);
        let root_path = self.check_preconditions(&connectors).await?;

        let mut report = PipelineReport {
            pipeline: self.config.name.0.clone(),
            ..PipelineReport::default()
        };

        let frequency = self.config.frequency;
        if frequency.is_single_shot() {
            tracing::info!("no frequency set, pipeline will exit after the first cycle");
        }

        tracing::info!(root = %root_path, "starting sync");
        loop {
            let summary = self.run_cycle(&connectors, &root_path).await?;
            report.cycles += 1;
            report.transferred += summary.transferred;
            report.fees_paid += summary.fees_paid;

            if summary.cancelled {
                report.cancelled = true;
                break;
            }
            if frequency.is_single_shot() {
                break;
            }

            self.transition(PipelineState::Sleeping);
            tracing::info!(duration = %frequency, "sleeping inside pipeline");
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::info!("cancellation requested while sleeping");
                    report.cancelled = true;
                    break;
                }
                () = tokio::time::sleep(frequency.as_duration()) => {}
            }
        }

        self.transition(PipelineState::Terminated);
        tracing::info!(
            cycles = report.cycles,
            transferred = report.transferred,
            fees_paid = report.fees_paid,
            "pipeline finished"
        );
        Ok(report)
    }

    /// Drive existence and destination root path, checked once per lifetime.
    async fn check_preconditions(&self, connectors: &Connectors) -> Result<String, SyncError> {
        let drive = &self.config.drive;
        let destination = connectors.destination.as_ref();

        if !destination.drive_exists(&drive.id).await? {
            return Err(SyncError::DestinationNotFound {
                drive_id: drive.id.clone(),
            });
        }

        let root_path = resolve_folder_path(destination, &drive.parent_folder_id).await?;
        if root_path.is_empty() {
            return Err(SyncError::DestinationFolderNotFound {
                folder_id: drive.parent_folder_id.clone(),
            });
        }
        Ok(root_path)
    }

    /// One Polling -> Transferring pass.
    pub(crate) async fn run_cycle(
        &mut self,
        connectors: &Connectors,
        root_path: &str,
    ) -> Result<CycleSummary, SyncError> {
        self.transition(PipelineState::Polling);
        let parent_folder_id = self.config.drive.parent_folder_id.clone();

        let source_objects = connectors.source.list().await?;
        tracing::info!(count = source_objects.len(), "acquired object storage files");

        let destination_objects = connectors.destination.list_files(&parent_folder_id).await?;
        tracing::info!(count = destination_objects.len(), "acquired destination files");

        let delta = compute_delta(&source_objects, &destination_objects, root_path);
        tracing::info!(count = delta.len(), "identified files to sync");

        let mut summary = CycleSummary {
            source_count: source_objects.len(),
            destination_count: destination_objects.len(),
            delta_count: delta.len(),
            ..CycleSummary::default()
        };

        self.transition(PipelineState::Transferring);
        let orchestrator = TransferOrchestrator::new(
            connectors.source.as_ref(),
            connectors.destination.as_ref(),
            &parent_folder_id,
            self.config.enable_manifest,
        );
        for object in &delta {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    remaining = delta.len() as u64 - summary.transferred,
                    "cancellation requested between transfers"
                );
                summary.cancelled = true;
                break;
            }

            let transferred = orchestrator.transfer(object).await.map_err(|err| {
                tracing::error!(object = %object.key, error = %err, "transfer failed");
                err
            })?;
            tracing::info!(
                object = %object.key,
                fees_paid = transferred.total_fees,
                entities = %transferred.receipt.entity_ids().join(", "),
                "file uploaded to destination"
            );
            summary.transferred += 1;
            summary.fees_paid += transferred.total_fees;
        }

        Ok(summary)
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::debug!(from = %self.state, to = %next, "pipeline state");
        self.state = next;
    }
}
