//! `cornelius run`: start the scheduler in the foreground.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use cornelius_core::Config;
use cornelius_daemon::{start_blocking, LogFormat, LogOptions};
use cornelius_sync::LiveConnectors;

/// Arguments for `cornelius run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML configuration file.
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// ArDrive CLI executable used for every destination call.
    #[arg(long, default_value = "ardrive")]
    pub ardrive_cli: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long)]
    pub debug: bool,

    /// Log entry encoding: text or json.
    #[arg(long, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = Config::load(&self.config).with_context(|| {
            format!("failed to load configuration from {}", self.config.display())
        })?;

        let factory = Arc::new(LiveConnectors::new(self.ardrive_cli));
        let logging = LogOptions {
            format: self.log_format,
            debug: self.debug,
        };

        let reports =
            start_blocking(config, factory, logging).context("one or more pipelines failed")?;
        for report in &reports {
            println!(
                "✓ '{}' finished ({} cycles, {} transferred, {} fees paid{})",
                report.pipeline,
                report.cycles,
                report.transferred,
                report.fees_paid,
                if report.cancelled { ", cancelled" } else { "" },
            );
        }
        Ok(())
    }
}
