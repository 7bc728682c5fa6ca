//! Cornelius runtime: one task per pipeline, process logging, ctrl-c.

mod error;
pub mod logging;
pub mod paths;
mod runtime;

pub use error::DaemonError;
pub use logging::{init_tracing, LogFormat, LogOptions};
pub use runtime::{run, start_blocking, Scheduler};
