//! Cornelius: replicate S3-compatible buckets into ArDrive folders.
//!
//! # Usage
//!
//! ```text
//! cornelius run --config <file> [--ardrive-cli <path>] [--debug] [--log-format text|json]
//! cornelius validate --config <file> [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run::RunArgs, validate::ValidateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "cornelius",
    version,
    about = "Continuously replicate object storage buckets into ArDrive",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every configured pipeline until done, failed, or interrupted.
    Run(RunArgs),

    /// Load and validate a configuration file without contacting any service.
    Validate(ValidateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Validate(args) => args.run(),
    }
}
