//! Domain types for the Cornelius pipeline configuration.
//!
//! All path fields use `PathBuf`. All types are deserializable via
//! serde + serde_yaml and immutable once loaded.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::duration::Frequency;

/// Region used when a bucket does not name one. S3-compatible servers such as
/// MinIO accept any region string.
pub const DEFAULT_REGION: &str = "us-east-1";

const REDACTED: &str = "<redacted>";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed pipeline name, unique within one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PipelineName(pub String);

impl fmt::Display for PipelineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PipelineName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PipelineName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Source and destination descriptors
// ---------------------------------------------------------------------------

/// An S3-compatible bucket to replicate from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// `host[:port]` of the object storage endpoint, optionally with a scheme.
    pub host: String,
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub access_id: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub is_secure: bool,
    #[serde(default)]
    pub is_recursive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl BucketConfig {
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}

impl fmt::Debug for BucketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketConfig")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("access_id", &self.access_id)
            .field("secret_key", &REDACTED)
            .field("is_secure", &self.is_secure)
            .field("is_recursive", &self.is_recursive)
            .field("region", &self.region())
            .finish()
    }
}

/// The ArDrive drive and folder objects are replicated into.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveConfig {
    pub id: String,
    pub wallet_path: PathBuf,
    /// Drive password; only meaningful for private drives.
    #[serde(default)]
    pub password: String,
    pub parent_folder_id: String,
    #[serde(default)]
    pub is_public: bool,
}

impl fmt::Debug for DriveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveConfig")
            .field("id", &self.id)
            .field("wallet_path", &self.wallet_path)
            .field("password", &REDACTED)
            .field("parent_folder_id", &self.parent_folder_id)
            .field("is_public", &self.is_public)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Pipeline and root document
// ---------------------------------------------------------------------------

/// One bucket-to-folder replication task with its own schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: PipelineName,
    pub bucket: BucketConfig,
    #[serde(rename = "drive")]
    pub drive: DriveConfig,
    #[serde(default)]
    pub enable_manifest: bool,
    #[serde(default)]
    pub frequency: Frequency,
}

/// Root of the Cornelius YAML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Parsed and reported, but every pipeline always gets its own task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    /// Base directory under which each pipeline stages downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_directory: Option<PathBuf>,
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

impl Config {
    /// Base staging directory: `tmp_directory`, or `<os temp>/cornelius`.
    pub fn staging_root(&self) -> PathBuf {
        match &self.tmp_directory {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => std::env::temp_dir().join("cornelius"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> BucketConfig {
        BucketConfig {
            host: "minio.local:9000".into(),
            name: "assets".into(),
            prefix: String::new(),
            access_id: "AKIAEXAMPLE".into(),
            secret_key: "super-secret".into(),
            is_secure: false,
            is_recursive: true,
            region: None,
        }
    }

    #[test]
    fn newtype_display() {
        assert_eq!(PipelineName::from("site").to_string(), "site");
    }

    #[test]
    fn bucket_debug_redacts_secret_key() {
        let rendered = format!("{:?}", bucket());
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("AKIAEXAMPLE"));
    }

    #[test]
    fn drive_debug_redacts_password() {
        let drive = DriveConfig {
            id: "drive".into(),
            wallet_path: PathBuf::from("/etc/cornelius/wallet.json"),
            password: "hunter2".into(),
            parent_folder_id: "folder".into(),
            is_public: false,
        };
        assert!(!format!("{drive:?}").contains("hunter2"));
    }

    #[test]
    fn region_defaults_when_absent() {
        let mut b = bucket();
        assert_eq!(b.region(), DEFAULT_REGION);
        b.region = Some("eu-central-1".into());
        assert_eq!(b.region(), "eu-central-1");
    }

    #[test]
    fn staging_root_falls_back_to_temp_dir() {
        let config = Config::default();
        assert_eq!(config.staging_root(), std::env::temp_dir().join("cornelius"));

        let config = Config {
            tmp_directory: Some(PathBuf::from("/var/tmp/cornelius")),
            ..Config::default()
        };
        assert_eq!(config.staging_root(), PathBuf::from("/var/tmp/cornelius"));
    }
}
