//! Objects flowing through one poll cycle.
//!
//! Listings are produced fresh on every poll and carry no persisted identity.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Largest object the destination accepts, in bytes.
pub const FILE_SIZE_LIMIT: u64 = 2_000_000_000;

/// Base name that triggers manifest generation.
pub const MANIFEST_INDEX_NAME: &str = "index.html";

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// One object in the source bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceObject {
    /// Full key within the bucket, unique within one listing.
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub content_type: Option<String>,
    pub size: u64,
}

impl SourceObject {
    /// Zero-byte objects are folder markers; oversized ones cannot be uploaded.
    pub fn is_transferable(&self) -> bool {
        self.size > 0 && self.size <= FILE_SIZE_LIMIT
    }
}

/// One file already present under the destination folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationObject {
    /// Absolute logical path, e.g. `/Drive Root/site/index.html`.
    pub path: String,
    pub last_modified: DateTime<Utc>,
    pub content_type: Option<String>,
}

/// Replace a missing or epoch timestamp with `now`.
///
/// A zero timestamp usually means the object was just created and the backend
/// has not settled its metadata yet.
pub fn effective_timestamp(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match ts {
        Some(ts) if ts.timestamp() > 0 => ts,
        _ => now,
    }
}

// ---------------------------------------------------------------------------
// Staging
// ---------------------------------------------------------------------------

/// A downloaded object waiting to be uploaded.
///
/// Owned exclusively by the transfer that created it and removed before that
/// transfer returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Directory the file was staged into.
    pub dir: PathBuf,
    pub content_type: Option<String>,
}

impl StagedFile {
    pub fn new(path: PathBuf, content_type: Option<String>) -> Self {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            path,
            dir,
            content_type,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    pub fn is_manifest_index(&self) -> bool {
        self.file_name() == Some(MANIFEST_INDEX_NAME)
    }
}

// ---------------------------------------------------------------------------
// Upload receipts
// ---------------------------------------------------------------------------

/// Result of one upload as reported by the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    #[serde(default)]
    pub created: Vec<CreatedEntity>,
    #[serde(default)]
    pub tips: Vec<Tip>,
    /// Transaction id to fee, in the smallest currency unit.
    #[serde(default)]
    pub fees: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntity {
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default, alias = "data_tx_id")]
    pub data_tx_id: Option<String>,
    #[serde(default, alias = "metadata_tx_id")]
    pub metadata_tx_id: Option<String>,
    #[serde(default)]
    pub bundled_in: Option<String>,
    #[serde(default)]
    pub source_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    #[serde(default)]
    pub tx_id: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub winston: String,
}

impl TransferReceipt {
    /// All non-empty entity ids, in creation order.
    pub fn entity_ids(&self) -> Vec<&str> {
        self.created
            .iter()
            .filter_map(|entity| entity.entity_id.as_deref())
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// The first created entity, i.e. the uploaded file itself.
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_ids().into_iter().next()
    }

    /// Sum of every fee in the receipt.
    ///
    /// Fees are unsigned winston amounts, so a non-numeric or negative fee is
    /// an error for the whole transfer.
    pub fn total_fees(&self) -> Result<u64, SyncError> {
        let mut total: u64 = 0;
        for value in self.fees.values() {
            let fee: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                SyncError::FeeParse {
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            total = total.checked_add(fee).ok_or_else(|| SyncError::FeeParse {
                value: value.clone(),
                reason: "total fee overflows".to_string(),
            })?;
        }
        Ok(total)
    }
}
