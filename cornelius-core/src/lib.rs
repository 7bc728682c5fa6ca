//! Cornelius core library: configuration model, duration parsing, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes and pipeline configuration structs
//! - [`duration`]: [`Frequency`], the poll interval of a pipeline
//! - [`config`]: load / parse / validate
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod duration;
pub mod error;
pub mod types;

pub use duration::Frequency;
pub use error::ConfigError;
pub use types::{BucketConfig, Config, DriveConfig, PipelineConfig, PipelineName};
