//! Removal of generated artifacts.
//!
//! Locally this deletes the subtitles and job info files written beside each
//! discovered video. Remotely it empties the run's bucket and deletes it.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};
use transx_models::{is_subtitle_file_name, job_info_file_name, media_key, SourceItem};
use transx_storage::ObjectStore;

use crate::error::WorkerResult;

/// What a clean removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    pub files_removed: Vec<PathBuf>,
    pub objects_removed: usize,
    pub bucket_removed: bool,
}

/// Generated files beside `item`, for any language.
async fn generated_files(
    item: &SourceItem,
    subtitle_extension: &str,
) -> WorkerResult<Vec<PathBuf>> {
    let Some(file_name) = item.file_name() else {
        return Ok(Vec::new());
    };
    let key = media_key(file_name);
    let info_name = job_info_file_name(&key);

    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(item.directory()).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name == info_name || is_subtitle_file_name(name, &key, subtitle_extension) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Delete the subtitles and job info files generated for `items`.
///
/// Source videos and unrelated files are left alone.
pub async fn clean_local(
    items: &[SourceItem],
    subtitle_extension: &str,
) -> WorkerResult<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for item in items {
        for path in generated_files(item, subtitle_extension).await? {
            if removed.contains(&path) {
                continue;
            }
            tokio::fs::remove_file(&path).await?;
            debug!(path = %path.display(), "Removed generated file");
            removed.push(path);
        }
    }
    info!("[{}] generated files removed", removed.len());
    Ok(removed)
}

/// Delete every object in `bucket`, then the bucket itself.
///
/// Returns the number of objects deleted, or `None` when the bucket does not
/// exist.
pub async fn clean_bucket(store: &dyn ObjectStore, bucket: &str) -> WorkerResult<Option<usize>> {
    if !store.list_buckets().await?.iter().any(|b| b == bucket) {
        info!(bucket, "Bucket not found, nothing to remove");
        return Ok(None);
    }

    let keys = store.list_objects(bucket, "").await?;
    for key in &keys {
        store.delete_object(bucket, key).await?;
    }
    store.delete_bucket(bucket).await?;
    info!(bucket, objects = keys.len(), "Bucket removed");
    Ok(Some(keys.len()))
}

