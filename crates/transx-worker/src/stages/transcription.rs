//! Speech-to-text stage.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;
use transx_models::{
    job_info_file_name, media_key, s3_uri, transcription_job_name, JobOutcome, RemoteJobState,
    SkipReason, SourceItem, Stage, StageOutcome, TranscriptionJobInfo, TranscriptionRecord,
    UploadRecord,
};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::StageLogger;
use crate::poller::JobPoller;
use crate::services::{TranscriptionJobRequest, TranscriptionJobStatus, TranscriptionService};

pub struct TranscriptionStage {
    service: Arc<dyn TranscriptionService>,
    poller: JobPoller,
    bucket: String,
    media_format: String,
    subtitle_format: String,
    logger: StageLogger,
}

impl TranscriptionStage {
    pub fn new(
        service: Arc<dyn TranscriptionService>,
        poller: JobPoller,
        bucket: impl Into<String>,
        media_format: impl Into<String>,
        subtitle_format: impl Into<String>,
    ) -> Self {
        Self {
            service,
            poller,
            bucket: bucket.into(),
            media_format: media_format.into(),
            subtitle_format: subtitle_format.into(),
            logger: StageLogger::new(Stage::Transcribe),
        }
    }

    fn request_for(
        &self,
        upload: &UploadRecord,
        job_name: &str,
        media_key: &str,
    ) -> TranscriptionJobRequest {
        TranscriptionJobRequest {
            job_name: job_name.to_string(),
            media_uri: s3_uri(&self.bucket, &upload.remote_key),
            media_format: self.media_format.to_ascii_lowercase(),
            output_bucket: self.bucket.clone(),
            output_key: format!("{}/transcribe/{}", job_name, media_key),
            subtitle_format: self.subtitle_format.to_ascii_lowercase(),
            identify_multiple_languages: true,
        }
    }

    /// Submit one job for the upload and wait for it to finish.
    ///
    /// Submission errors, timeouts and failed jobs skip the item.
    /// Cancellation aborts the run.
    pub async fn transcribe(
        &self,
        upload: UploadRecord,
    ) -> WorkerResult<StageOutcome<TranscriptionRecord>> {
        let item = upload.source.clone();
        let job_name = transcription_job_name(
            &upload.remote_key,
            chrono::Utc::now().timestamp_millis(),
        );
        let media_key = media_key(&upload.remote_key);
        let request = self.request_for(&upload, &job_name, &media_key);

        self.logger
            .log_start(&item, &format!("Transcribing {} as {}", request.media_uri, job_name));

        if let Err(e) = self.service.start_job(&request).await {
            return Ok(self.skip(&item, e.to_string()));
        }

        let service = &self.service;
        let name = job_name.as_str();
        let status = match self.poller.wait_for(name, move || service.job_status(name)).await {
            Ok(status) => status,
            Err(e) => {
                let err = e.into_worker_error(name);
                if err.is_fatal() {
                    return Err(err);
                }
                return Ok(self.skip(&item, err.to_string()));
            }
        };

        match status.outcome() {
            Some(JobOutcome::Succeeded) => {
                metrics::counter!("transx_transcriptions_total", "result" => "completed")
                    .increment(1);
                self.logger
                    .log_progress(&item, &format!("Job {} completed", job_name));
                if let Err(e) = self.write_job_info(&item, &media_key, &job_name, &status).await {
                    warn!(job = %job_name, "Could not write job info: {}", e);
                }
                Ok(StageOutcome::Completed(TranscriptionRecord::new(
                    upload, job_name, media_key,
                )))
            }
            Some(JobOutcome::Failed(reason)) => {
                metrics::counter!("transx_transcriptions_total", "result" => "failed")
                    .increment(1);
                let err = WorkerError::job_failed(&job_name, status.as_str(), reason);
                Ok(self.skip(&item, err.to_string()))
            }
            None => Ok(self.skip(
                &item,
                format!("job {} returned non-terminal state {}", job_name, status.as_str()),
            )),
        }
    }

    /// Record the finished job beside the video as `{media_key}.transcribe.json`.
    async fn write_job_info(
        &self,
        item: &SourceItem,
        media_key: &str,
        job_name: &str,
        status: &TranscriptionJobStatus,
    ) -> WorkerResult<PathBuf> {
        let info = TranscriptionJobInfo {
            transcription_job_name: job_name.to_string(),
            language_codes: status.language_codes.clone(),
        };
        let json = serde_json::to_vec_pretty(&info)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let path = item.directory().join(job_info_file_name(media_key));
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }

    fn skip<T>(&self, item: &SourceItem, reason: impl Into<String>) -> StageOutcome<T> {
        let reason = SkipReason::new(Stage::Transcribe, item, reason);
        self.logger.log_skip(&reason);
        StageOutcome::Skipped(reason)
    }
}
