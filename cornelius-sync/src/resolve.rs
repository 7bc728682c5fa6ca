//! Destination folder path resolution.
//!
//! Walks parent links with an explicit loop until a root folder is reached,
//! then joins the collected names root-first: `/<root>/<child>/.../<folder>`.

use crate::connector::Destination;
use crate::error::SyncError;

/// Upper bound on parent hops; a longer chain is treated as a cycle.
pub const MAX_FOLDER_DEPTH: usize = 256;

/// Resolve the absolute logical path of `folder_id`.
///
/// Returns an empty string when every folder on the chain is unnamed; the
/// caller decides whether that is fatal.
pub async fn resolve_folder_path(
    destination: &dyn Destination,
    folder_id: &str,
) -> Result<String, SyncError> {
    let mut names = Vec::new();
    let mut current = folder_id.to_string();

    for _ in 0..MAX_FOLDER_DEPTH {
        let info = destination.folder_info(&current).await?;
        tracing::debug!(folder_id = %current, name = %info.name, is_root = info.is_root, "resolved folder");
        names.push(info.name);

        if info.is_root {
            return Ok(join_root_first(&names));
        }

        current = match info.parent_id {
            Some(parent) if !parent.is_empty() => parent,
            _ => {
                return Err(SyncError::Resolve {
                    folder_id: folder_id.to_string(),
                    reason: format!("folder {current} has no parent and is not a root"),
                })
            }
        };
    }

    Err(SyncError::Resolve {
        folder_id: folder_id.to_string(),
        reason: format!("exceeded {MAX_FOLDER_DEPTH} parent hops; parent links form a cycle"),
    })
}

fn join_root_first(leaf_first: &[String]) -> String {
    let segments: Vec<&str> = leaf_first
        .iter()
        .rev()
        .map(|name| name.trim_matches('/'))
        .filter(|name| !name.is_empty())
        .collect();
    if segments.is_empty() {
        return String::new();
    }
    format!("/{}", segments.join("/"))
}
