#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use cornelius_core::DriveConfig;
use cornelius_sync::{resolve_folder_path, ArdriveClient, Destination, StagedFile, SyncError};
use tempfile::TempDir;

const FAKE_CLI: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
case "$1" in
  list-all-drives)
    echo '[{"driveId":"drive-1","name":"Site","drivePrivacy":"public"}]' ;;
  folder-info)
    case "$3" in
      root-id) echo '{"name":"Drive","parentFolderId":"root folder"}' ;;
      site-id) echo '{"name":"site","parentFolderId":"root-id"}' ;;
      *) echo "folder $3 not found" >&2; exit 1 ;;
    esac ;;
  list-folder)
    echo '[{"entityType":"folder","path":"/Drive/site/css"},{"entityType":"file","path":"/Drive/site/index.html","dataContentType":"text/html","lastModifiedDate":1700000000000}]' ;;
  upload-file)
    echo '{"created":[{"type":"file","entityName":"index.html","entityId":"file-1","dataTxId":"d1"}],"tips":[],"fees":{"d1":"42"}}' ;;
  file-info)
    echo '{"name":"index.html","parentFolderId":"site-id"}' ;;
  create-manifest)
    echo '{"created":[{"type":"file","entityId":"manifest-1"}],"tips":[],"fees":{}}' ;;
  *)
    echo "unknown command $1" >&2; exit 2 ;;
esac
"#;

fn drive(is_public: bool) -> DriveConfig {
    DriveConfig {
        id: "drive-1".into(),
        wallet_path: PathBuf::from("/keys/wallet.json"),
        password: "hunter2".into(),
        parent_folder_id: "site-id".into(),
        is_public,
    }
}

// One test drives every command so the script is written and executed by a
// single thread.
#[tokio::test]
async fn fake_cli_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let program = dir.path().join("ardrive");
    fs::write(&program, FAKE_CLI).expect("write fake cli");
    fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).expect("chmod");

    let public = ArdriveClient::new(&program, &drive(true)).expect("client");

    assert!(public.drive_exists("drive-1").await.expect("drives"));
    assert!(!public.drive_exists("drive-2").await.expect("drives"));

    let root = resolve_folder_path(&public, "site-id").await.expect("resolve");
    assert_eq!(root, "/Drive/site");

    let err = public.folder_info("missing").await.unwrap_err();
    assert!(matches!(err, SyncError::Resolve { .. }), "got: {err}");
    assert!(err.to_string().contains("folder missing not found"), "got: {err}");

    let files = public.list_files("site-id").await.expect("list");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "/Drive/site/index.html");

    let staged_path = dir.path().join("index.html");
    fs::write(&staged_path, "<html></html>").expect("stage");
    let staged = StagedFile::new(staged_path.clone(), None);
    let receipt = public
        .upload(&staged, "site-id", Some("text/html"))
        .await
        .expect("upload");
    assert_eq!(receipt.entity_id(), Some("file-1"));
    assert_eq!(receipt.total_fees().expect("fees"), 42);

    assert_eq!(public.parent_folder_of("file-1").await.expect("file-info"), "site-id");
    public.create_manifest("site-id").await.expect("manifest");

    let private = ArdriveClient::new(&program, &drive(false)).expect("client");
    private.list_files("site-id").await.expect("private list");

    let calls = fs::read_to_string(dir.path().join("calls.log")).expect("calls log");
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(calls[0], "list-all-drives -w /keys/wallet.json");
    assert_eq!(calls[2], "folder-info --folder-id site-id");
    assert!(calls.contains(&format!(
        "upload-file --parent-folder-id site-id --local-path {} --content-type text/html -w /keys/wallet.json",
        staged_path.display()
    )
    .as_str()));
    assert!(calls.contains(&"create-manifest -f site-id -w /keys/wallet.json"));
    assert_eq!(
        calls.last().copied(),
        Some("list-folder --parent-folder-id site-id --all -w /keys/wallet.json --unsafe-drive-password hunter2")
    );
}
