use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use cornelius_core::{Config, PipelineConfig};
use cornelius_sync::{ConnectorFactory, PipelineExecutor, PipelineReport};

use crate::error::{io_err, DaemonError};
use crate::logging::{init_tracing, LogOptions};
use crate::paths::{allocate_staging_dir, remove_staging_dir};

/// Runs one isolated task per pipeline and waits for all of them.
pub struct Scheduler {
    factory: Arc<dyn ConnectorFactory>,
    staging_root: PathBuf,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(factory: Arc<dyn ConnectorFactory>, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            factory,
            staging_root: staging_root.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Share an externally owned cancellation signal with every pipeline.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Launch every pipeline and wait until all have finished.
    ///
    /// A failing pipeline does not cancel its siblings. Returns every report
    /// when all succeed, otherwise the first failure observed.
    pub async fn run(
        &self,
        pipelines: Vec<PipelineConfig>,
    ) -> Result<Vec<PipelineReport>, DaemonError> {
        let mut tasks = JoinSet::new();
        for pipeline in pipelines {
            let span = tracing::info_span!("pipeline", pipeline = %pipeline.name);
            let factory = self.factory.clone();
            let staging_root = self.staging_root.clone();
            let cancel = self.cancel.child_token();

            tasks.spawn(
                supervise_pipeline(pipeline, staging_root, factory, cancel).instrument(span),
            );
        }
        tracing::info!(pipelines = tasks.len(), "scheduler started");

        let mut reports = Vec::new();
        let mut first_error: Option<DaemonError> = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(result) => result,
                Err(err) => Err(DaemonError::Join {
                    pipeline: "<unknown>".into(),
                    reason: err.to_string(),
                }),
            };
            match outcome {
                Ok(report) => reports.push(report),
                Err(err) => {
                    tracing::error!(
                        pipeline = err.pipeline().unwrap_or("<unknown>"),
                        error = %err,
                        "pipeline terminated with error"
                    );
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                reports.sort_by(|a, b| a.pipeline.cmp(&b.pipeline));
                Ok(reports)
            }
        }
    }
}

/// Own the pipeline's staging directory around the executor task.
///
/// The executor runs in its own task so a panic surfaces as a `JoinError`
/// attributed to this pipeline; the directory is removed either way.
async fn supervise_pipeline(
    pipeline: PipelineConfig,
    staging_root: PathBuf,
    factory: Arc<dyn ConnectorFactory>,
    cancel: CancellationToken,
) -> Result<PipelineReport, DaemonError> {
    let name = pipeline.name.to_string();
    let staging_dir = allocate_staging_dir(&staging_root, &pipeline.name)?;
    tracing::info!(staging_dir = %staging_dir.display(), "starting pipeline");

    let joined = tokio::spawn(
        run_pipeline(pipeline, staging_dir.clone(), factory, cancel).in_current_span(),
    )
    .await;
    remove_staging_dir(&staging_dir).await;
    handle_join(&name, joined)
}

async fn run_pipeline(
    pipeline: PipelineConfig,
    staging_dir: PathBuf,
    factory: Arc<dyn ConnectorFactory>,
    cancel: CancellationToken,
) -> Result<PipelineReport, DaemonError> {
    let name = pipeline.name.to_string();
    PipelineExecutor::new(pipeline, staging_dir, factory, cancel)
        .run()
        .await
        .map_err(|source| DaemonError::PipelineFailed {
            pipeline: name,
            source,
        })
}

fn handle_join(
    pipeline: &str,
    result: Result<Result<PipelineReport, DaemonError>, JoinError>,
) -> Result<PipelineReport, DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join {
            pipeline: pipeline.to_string(),
            reason: if err.is_panic() {
                "task panicked".to_string()
            } else {
                err.to_string()
            },
        }),
    }
}

/// Run every configured pipeline until done or interrupted by ctrl-c.
pub async fn run(
    config: Config,
    factory: Arc<dyn ConnectorFactory>,
) -> Result<Vec<PipelineReport>, DaemonError> {
    if let Some(concurrency) = config.concurrency {
        tracing::debug!(concurrency, "concurrency is informational; each pipeline runs as its own task");
    }

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(factory, config.staging_root()).with_cancellation(cancel.clone());

    let signal_handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, stopping pipelines");
                            cancel.cancel();
                        }
                        Err(err) => tracing::warn!(error = %err, "ctrl-c handler failed"),
                    }
                }
            }
        })
    };

    let result = scheduler.run(config.pipelines).await;
    cancel.cancel();
    let _ = signal_handle.await;
    result
}

/// Start the runtime and block the current thread until every pipeline exits.
pub fn start_blocking(
    config: Config,
    factory: Arc<dyn ConnectorFactory>,
    logging: LogOptions,
) -> Result<Vec<PipelineReport>, DaemonError> {
    init_tracing(logging);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, factory))
}
