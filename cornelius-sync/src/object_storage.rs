//! S3-compatible object storage source.
//!
//! Lists and downloads objects with static credentials and path-style
//! addressing, which is what MinIO and most self-hosted stores expect.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use cornelius_core::BucketConfig;

use crate::connector::ObjectSource;
use crate::error::{io_err, SyncError};
use crate::model::{effective_timestamp, SourceObject, StagedFile, FILE_SIZE_LIMIT};

const CREDENTIALS_PROVIDER: &str = "cornelius-static";

/// Object source backed by one bucket/prefix.
pub struct S3Source {
    client: S3Client,
    bucket: String,
    prefix: String,
    recursive: bool,
    staging_dir: PathBuf,
}

impl S3Source {
    /// Build a client for `bucket`. No request is made until the first listing.
    pub fn connect(bucket: &BucketConfig, staging_dir: &Path) -> Result<Self, SyncError> {
        let endpoint = endpoint_url(&bucket.host, bucket.is_secure)?;
        let credentials = Credentials::new(
            &bucket.access_id,
            &bucket.secret_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(bucket.region().to_string()))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: S3Client::from_conf(config),
            bucket: bucket.name.clone(),
            prefix: bucket.prefix.clone(),
            recursive: bucket.is_recursive,
            staging_dir: staging_dir.to_path_buf(),
        })
    }
}

#[async_trait]
impl ObjectSource for S3Source {
    async fn list(&self) -> Result<Vec<SourceObject>, SyncError> {
        let now = Utc::now();
        let mut results = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token.take());
            if !self.prefix.is_empty() {
                request = request.prefix(&self.prefix);
            }
            if !self.recursive {
                request = request.delimiter("/");
            }

            let response = request.send().await.map_err(|e| SyncError::List {
                what: "object storage bucket",
                reason: DisplayErrorContext(&e).to_string(),
            })?;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                let last_modified = object
                    .last_modified()
                    .and_then(|d| DateTime::<Utc>::from_timestamp(d.secs(), d.subsec_nanos()));
                if let Some(entry) =
                    listing_entry(key, object.size().unwrap_or(0), last_modified, now)
                {
                    results.push(entry);
                }
            }

            if !response.is_truncated().unwrap_or(false) {
                break;
            }
            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(results)
    }

    async fn download(&self, object: &SourceObject) -> Result<StagedFile, SyncError> {
        let path = staging_path(&self.staging_dir, &object.key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(parent, e))?;
        }

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| SyncError::Download {
                key: object.key.clone(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        let content_type = response
            .content_type()
            .map(str::to_string)
            .or_else(|| object.content_type.clone());

        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| io_err(&path, e))?;
        let copied = async {
            tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await
        }
        .await;
        if let Err(err) = copied {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(SyncError::Download {
                key: object.key.clone(),
                reason: err.to_string(),
            });
        }

        Ok(StagedFile::new(path, content_type))
    }
}

/// `http(s)://<host>` unless the host already carries a scheme.
pub fn endpoint_url(host: &str, is_secure: bool) -> Result<String, SyncError> {
    let host = host.trim();
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(SyncError::ConnectionInit {
            collaborator: "object storage",
            reason: format!("invalid host {host:?}"),
        });
    }
    if host.starts_with("http://") || host.starts_with("https://") {
        return Ok(host.trim_end_matches('/').to_string());
    }
    let scheme = if is_secure { "https" } else { "http" };
    Ok(format!("{scheme}://{}", host.trim_end_matches('/')))
}

/// Turn one listing row into a [`SourceObject`], or skip it.
fn listing_entry(
    key: &str,
    size: i64,
    last_modified: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<SourceObject> {
    if size <= 0 {
        tracing::warn!(key, "skipping file, file is empty and is likely just a folder");
        return None;
    }
    let size = size as u64;
    if size > FILE_SIZE_LIMIT {
        tracing::warn!(key, size, "skipping file, exceeds 2GB limit");
        return None;
    }
    if !is_stageable_key(key) {
        tracing::warn!(key, "skipping file, key cannot be staged below the staging directory");
        return None;
    }
    if last_modified.map_or(true, |ts| ts.timestamp() <= 0) {
        tracing::debug!(key, "missing or epoch last-modified time, treating object as just created");
    }

    Some(SourceObject {
        key: key.to_string(),
        last_modified: effective_timestamp(last_modified, now),
        content_type: None,
        size,
    })
}

/// Whether [`staging_path`] accepts `key`: it names a file and has no `..`
/// segment.
fn is_stageable_key(key: &str) -> bool {
    let mut named = false;
    for segment in key.split('/') {
        match segment {
            "" | "." => {}
            ".." => return false,
            _ => named = true,
        }
    }
    named
}

/// Map an object key to a file below `staging_dir`, refusing keys that would
/// escape it.
pub fn staging_path(staging_dir: &Path, key: &str) -> Result<PathBuf, SyncError> {
    let mut path = staging_dir.to_path_buf();
    let mut pushed = false;
    for segment in key.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(SyncError::Download {
                    key: key.to_string(),
                    reason: "key escapes the staging directory".into(),
                })
            }
            segment => {
                path.push(segment);
                pushed = true;
            }
        }
    }
    if !pushed {
        return Err(SyncError::Download {
            key: key.to_string(),
            reason: "key has no file name".into(),
        });
    }
    Ok(path)
}
