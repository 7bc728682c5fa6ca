//! ArDrive destination backed by the `ardrive` CLI.
//!
//! Every call spawns the CLI and parses its JSON stdout. Non-zero exits carry
//! the combined stdout/stderr in the returned error.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::process::Command;

use cornelius_core::DriveConfig;

use crate::connector::{Destination, FolderInfo};
use crate::error::SyncError;
use crate::model::{effective_timestamp, DestinationObject, StagedFile, TransferReceipt};

/// `parentFolderId` value the CLI reports for a drive's root folder.
pub const ROOT_FOLDER_SENTINEL: &str = "root folder";

const ENTITY_TYPE_FOLDER: &str = "folder";
const PASSWORD_FLAG: &str = "--unsafe-drive-password";

/// Which credentials a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Writes, or lists everything the wallet owns.
    Wallet,
    /// Reads inside the configured drive; public drives need no credentials.
    Drive,
}

/// Client for one pipeline's drive.
pub struct ArdriveClient {
    program: PathBuf,
    wallet_path: PathBuf,
    password: String,
    is_public: bool,
}

impl std::fmt::Debug for ArdriveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArdriveClient")
            .field("program", &self.program)
            .field("wallet_path", &self.wallet_path)
            .field("password", &"<redacted>")
            .field("is_public", &self.is_public)
            .finish()
    }
}

impl ArdriveClient {
    pub fn new(program: &Path, drive: &DriveConfig) -> Result<Self, SyncError> {
        if program.as_os_str().is_empty() {
            return Err(SyncError::ConnectionInit {
                collaborator: "ardrive",
                reason: "executable path is empty".into(),
            });
        }
        if drive.wallet_path.as_os_str().is_empty() {
            return Err(SyncError::ConnectionInit {
                collaborator: "ardrive",
                reason: "wallet path is empty".into(),
            });
        }
        Ok(Self {
            program: program.to_path_buf(),
            wallet_path: drive.wallet_path.clone(),
            password: drive.password.clone(),
            is_public: drive.is_public,
        })
    }

    fn credential_args(&self, access: Access) -> Vec<OsString> {
        let mut args = Vec::new();
        if access == Access::Drive && self.is_public {
            return args;
        }
        args.push(OsString::from("-w"));
        args.push(self.wallet_path.clone().into_os_string());
        if !self.is_public && !self.password.is_empty() {
            args.push(OsString::from(PASSWORD_FLAG));
            args.push(OsString::from(&self.password));
        }
        args
    }

    /// Run one CLI command and return its stdout.
    async fn exec(&self, args: Vec<OsString>, access: Access) -> Result<Vec<u8>, SyncError> {
        let command = describe(&args);
        let mut full = args;
        full.extend(self.credential_args(access));
        tracing::debug!(program = %self.program.display(), command = %command, "running ardrive cli");

        let output = Command::new(&self.program)
            .args(&full)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SyncError::Command {
                command: command.clone(),
                reason: format!("unable to spawn {}: {e}", self.program.display()),
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(SyncError::Command {
                command,
                reason: format!("{}: {}", output.status, combined.trim()),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl Destination for ArdriveClient {
    async fn drive_exists(&self, drive_id: &str) -> Result<bool, SyncError> {
        let stdout = self
            .exec(vec!["list-all-drives".into()], Access::Wallet)
            .await
            .map_err(|e| SyncError::List {
                what: "destination drives",
                reason: e.to_string(),
            })?;
        let drive_ids = parse_drive_ids(&stdout)?;
        Ok(drive_ids.iter().any(|id| id == drive_id))
    }

    async fn folder_info(&self, folder_id: &str) -> Result<FolderInfo, SyncError> {
        let stdout = self
            .exec(
                vec!["folder-info".into(), "--folder-id".into(), folder_id.into()],
                Access::Drive,
            )
            .await
            .map_err(|e| SyncError::Resolve {
                folder_id: folder_id.to_string(),
                reason: e.to_string(),
            })?;
        parse_folder_info(&stdout)
    }

    async fn list_files(
        &self,
        parent_folder_id: &str,
    ) -> Result<Vec<DestinationObject>, SyncError> {
        let stdout = self
            .exec(
                vec![
                    "list-folder".into(),
                    "--parent-folder-id".into(),
                    parent_folder_id.into(),
                    "--all".into(),
                ],
                Access::Drive,
            )
            .await
            .map_err(|e| SyncError::List {
                what: "destination folder",
                reason: e.to_string(),
            })?;
        parse_listing(&stdout, Utc::now())
    }

    async fn upload(
        &self,
        staged: &StagedFile,
        parent_folder_id: &str,
        content_type: Option<&str>,
    ) -> Result<TransferReceipt, SyncError> {
        let mut args: Vec<OsString> = vec![
            "upload-file".into(),
            "--parent-folder-id".into(),
            parent_folder_id.into(),
            "--local-path".into(),
            staged.path.clone().into_os_string(),
        ];
        if let Some(content_type) = content_type {
            args.push("--content-type".into());
            args.push(content_type.into());
        }

        let stdout = self
            .exec(args, Access::Wallet)
            .await
            .map_err(|e| SyncError::Upload {
                path: staged.path.clone(),
                reason: e.to_string(),
            })?;
        serde_json::from_slice(&stdout).map_err(|e| SyncError::Upload {
            path: staged.path.clone(),
            reason: format!("unable to parse upload-file response: {e}"),
        })
    }

    async fn parent_folder_of(&self, entity_id: &str) -> Result<String, SyncError> {
        let stdout = self
            .exec(
                vec!["file-info".into(), "--file-id".into(), entity_id.into()],
                Access::Wallet,
            )
            .await?;
        parse_parent_folder(entity_id, &stdout)
    }

    async fn create_manifest(&self, folder_id: &str) -> Result<(), SyncError> {
        self.exec(
            vec!["create-manifest".into(), "-f".into(), folder_id.into()],
            Access::Wallet,
        )
        .await
        .map_err(|e| SyncError::Manifest {
            folder_id: folder_id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Command label for logs and errors. Never includes credentials.
fn describe(args: &[OsString]) -> String {
    let mut label = String::from("ardrive");
    for arg in args {
        label.push(' ');
        label.push_str(&arg.to_string_lossy());
    }
    label
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveEntry {
    #[serde(default)]
    drive_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    parent_folder_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingEntry {
    #[serde(default)]
    entity_type: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    data_content_type: Option<String>,
    /// Unix milliseconds.
    #[serde(default)]
    last_modified_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
    #[serde(default)]
    parent_folder_id: String,
}

fn parse_drive_ids(stdout: &[u8]) -> Result<Vec<String>, SyncError> {
    let drives: Vec<DriveEntry> = serde_json::from_slice(stdout)?;
    Ok(drives.into_iter().map(|d| d.drive_id).collect())
}

fn parse_folder_info(stdout: &[u8]) -> Result<FolderInfo, SyncError> {
    let entry: FolderEntry = serde_json::from_slice(stdout)?;
    let is_root = entry.parent_folder_id == ROOT_FOLDER_SENTINEL;
    let parent_id = if is_root || entry.parent_folder_id.is_empty() {
        None
    } else {
        Some(entry.parent_folder_id)
    };
    Ok(FolderInfo {
        name: entry.name,
        parent_id,
        is_root,
    })
}

fn parse_listing(stdout: &[u8], now: DateTime<Utc>) -> Result<Vec<DestinationObject>, SyncError> {
    let entries: Vec<ListingEntry> = serde_json::from_slice(stdout)?;
    let files = entries
        .into_iter()
        .filter(|entry| entry.entity_type != ENTITY_TYPE_FOLDER && !entry.path.is_empty())
        .map(|entry| DestinationObject {
            path: entry.path,
            last_modified: effective_timestamp(
                entry
                    .last_modified_date
                    .and_then(DateTime::<Utc>::from_timestamp_millis),
                now,
            ),
            content_type: entry.data_content_type.filter(|ct| !ct.is_empty()),
        })
        .collect();
    Ok(files)
}

fn parse_parent_folder(entity_id: &str, stdout: &[u8]) -> Result<String, SyncError> {
    let entry: FileEntry = serde_json::from_slice(stdout)?;
    if entry.parent_folder_id.is_empty() {
        return Err(SyncError::Resolve {
            folder_id: entity_id.to_string(),
            reason: "file-info response has no parentFolderId".into(),
        });
    }
    Ok(entry.parent_folder_id)
}
