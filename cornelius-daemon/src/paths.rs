use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;

use cornelius_core::PipelineName;

use crate::error::{io_err, DaemonError};

/// Length of the random suffix on each pipeline's staging directory.
pub const STAGING_SUFFIX_LEN: usize = 5;

const MAX_ALLOCATION_ATTEMPTS: usize = 16;

/// `<name>-<5 random lowercase letters>`, with path-hostile characters in the
/// name replaced by `_`.
pub fn staging_dir_name(pipeline: &PipelineName, rng: &mut impl Rng) -> String {
    let name: String = pipeline
        .0
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let suffix: String = (0..STAGING_SUFFIX_LEN)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect();
    format!("{name}-{suffix}")
}

/// Create a fresh staging directory for `pipeline` below `root`.
///
/// Never reuses an existing directory, so concurrent pipelines (or a second
/// process sharing `root`) cannot collide.
pub fn allocate_staging_dir(root: &Path, pipeline: &PipelineName) -> Result<PathBuf, DaemonError> {
    fs::create_dir_all(root).map_err(|e| io_err(root, e))?;

    let mut rng = rand::thread_rng();
    for _ in 0..MAX_ALLOCATION_ATTEMPTS {
        let candidate = root.join(staging_dir_name(pipeline, &mut rng));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(io_err(candidate, err)),
        }
    }
    Err(io_err(
        root,
        std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free staging directory for pipeline {pipeline}"),
        ),
    ))
}

/// Best-effort removal once a pipeline has finished.
pub async fn remove_staging_dir(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove staging directory");
        }
    }
}
