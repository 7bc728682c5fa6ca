//! `cornelius validate`: check a configuration file and summarise it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use cornelius_core::{Config, PipelineConfig};

/// Arguments for `cornelius validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the YAML configuration file.
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let config = Config::load(&self.config)
            .with_context(|| format!("invalid configuration {}", self.config.display()))?;

        if self.json {
            print_json(&config)?;
            return Ok(());
        }
        print_table(&config);
        Ok(())
    }
}

#[derive(Serialize)]
struct ConfigJson {
    staging_root: String,
    concurrency: Option<usize>,
    pipelines: Vec<PipelineJson>,
}

/// No credential fields.
#[derive(Serialize)]
struct PipelineJson {
    name: String,
    host: String,
    bucket: String,
    prefix: String,
    is_secure: bool,
    is_recursive: bool,
    drive_id: String,
    parent_folder_id: String,
    is_public: bool,
    enable_manifest: bool,
    frequency: String,
    single_shot: bool,
}

impl From<&PipelineConfig> for PipelineJson {
    fn from(p: &PipelineConfig) -> Self {
        Self {
            name: p.name.0.clone(),
            host: p.bucket.host.clone(),
            bucket: p.bucket.name.clone(),
            prefix: p.bucket.prefix.clone(),
            is_secure: p.bucket.is_secure,
            is_recursive: p.bucket.is_recursive,
            drive_id: p.drive.id.clone(),
            parent_folder_id: p.drive.parent_folder_id.clone(),
            is_public: p.drive.is_public,
            enable_manifest: p.enable_manifest,
            frequency: p.frequency.to_string(),
            single_shot: p.frequency.is_single_shot(),
        }
    }
}

#[derive(Tabled)]
struct PipelineRow {
    #[tabled(rename = "pipeline")]
    name: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "destination")]
    destination: String,
    #[tabled(rename = "every")]
    frequency: String,
    #[tabled(rename = "manifest")]
    manifest: String,
}

fn print_json(config: &Config) -> Result<()> {
    let payload = ConfigJson {
        staging_root: config.staging_root().display().to_string(),
        concurrency: config.concurrency,
        pipelines: config.pipelines.iter().map(PipelineJson::from).collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize configuration JSON")?
    );
    Ok(())
}

fn print_table(config: &Config) {
    println!(
        "Cornelius v{} | {} pipelines | staging in {}",
        env!("CARGO_PKG_VERSION"),
        config.pipelines.len(),
        config.staging_root().display(),
    );

    let rows: Vec<PipelineRow> = config
        .pipelines
        .iter()
        .map(|p| PipelineRow {
            name: p.name.0.clone(),
            source: source_label(p),
            destination: destination_label(p),
            frequency: if p.frequency.is_single_shot() {
                "once".to_string()
            } else {
                p.frequency.to_string()
            },
            manifest: if p.enable_manifest { "yes" } else { "no" }.to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{} configuration is valid", "✓".green().bold());
}

fn source_label(p: &PipelineConfig) -> String {
    let scheme = if p.bucket.is_secure { "https" } else { "http" };
    let mut label = format!("{scheme}://{}/{}", p.bucket.host, p.bucket.name);
    if !p.bucket.prefix.is_empty() {
        label.push('/');
        label.push_str(p.bucket.prefix.trim_start_matches('/'));
    }
    if !p.bucket.is_recursive {
        label.push_str(" (top level)");
    }
    label
}

fn destination_label(p: &PipelineConfig) -> String {
    let privacy = if p.drive.is_public { "public" } else { "private" };
    format!(
        "{} / {} ({privacy})",
        p.drive.id, p.drive.parent_folder_id
    )
}
