//! Upload of local videos to the bucket.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use transx_models::{SkipReason, SourceItem, Stage, StageOutcome, UploadRecord};
use transx_storage::{file_sha256, ObjectStore, StorageResult};

use crate::logging::StageLogger;

pub struct UploadStage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    force: bool,
    logger: StageLogger,
}

impl UploadStage {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            force: false,
            logger: StageLogger::new(Stage::Upload),
        }
    }

    /// Upload even when the remote object already matches the local file.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Upload one video under its base name.
    ///
    /// Directory structure is flattened, so two videos with the same base
    /// name overwrite each other remotely. A missing file is skipped without
    /// any remote call. An object whose SHA-256 already matches the local
    /// file is kept as is and the item continues.
    pub async fn put(&self, item: &SourceItem) -> StageOutcome<UploadRecord> {
        self.logger.log_start(item, "Uploading video");

        let is_file = tokio::fs::metadata(item.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return self.skip(item, "file does not exist or is not a regular file");
        }

        let Some(key) = item.file_name() else {
            return self.skip(item, "file name is not valid UTF-8");
        };

        if !self.force {
            match self.is_synced(key, item.path()).await {
                Ok(true) => {
                    metrics::counter!("transx_uploads_total", "result" => "synced").increment(1);
                    self.logger.log_progress(item, "Already synced, upload skipped");
                    return StageOutcome::Completed(UploadRecord::new(item.clone(), key));
                }
                Ok(false) => {}
                Err(e) => debug!(key, "Sync check failed, uploading: {}", e),
            }
        }

        match self.store.put_object(&self.bucket, key, item.path()).await {
            Ok(()) => {
                metrics::counter!("transx_uploads_total", "result" => "uploaded").increment(1);
                StageOutcome::Completed(UploadRecord::new(item.clone(), key))
            }
            Err(e) => self.skip(item, e.to_string()),
        }
    }

    async fn is_synced(&self, key: &str, path: &Path) -> StorageResult<bool> {
        let Some(remote) = self.store.object_checksum(&self.bucket, key).await? else {
            return Ok(false);
        };
        Ok(remote == file_sha256(path).await?)
    }

    fn skip(&self, item: &SourceItem, reason: impl Into<String>) -> StageOutcome<UploadRecord> {
        let reason = SkipReason::new(Stage::Upload, item, reason);
        self.logger.log_skip(&reason);
        StageOutcome::Skipped(reason)
    }
}
