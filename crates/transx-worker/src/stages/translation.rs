//! Multi-language translation stage.
//!
//! One job per item covers every target language, instead of one job per
//! (item, language) pair.

use std::sync::Arc;

use tracing::warn;
use transx_models::{
    key_prefix_from_uri, s3_uri, JobOutcome, RemoteJobState, SkipReason, SourceItem, Stage,
    StageOutcome, TargetLanguages, TranscriptionRecord, TranslationJobState, TranslationRecord,
};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::StageLogger;
use crate::poller::JobPoller;
use crate::services::{TranslationJobRequest, TranslationService};

/// Content type the transcription output is submitted as.
const INPUT_CONTENT_TYPE: &str = "text/plain";

pub struct TranslationStage {
    service: Arc<dyn TranslationService>,
    poller: JobPoller,
    bucket: String,
    role_arn: String,
    source_language: String,
    target_languages: TargetLanguages,
    logger: StageLogger,
}

impl TranslationStage {
    pub fn new(
        service: Arc<dyn TranslationService>,
        poller: JobPoller,
        bucket: impl Into<String>,
        role_arn: impl Into<String>,
        source_language: impl Into<String>,
        target_languages: TargetLanguages,
    ) -> Self {
        Self {
            service,
            poller,
            bucket: bucket.into(),
            role_arn: role_arn.into(),
            source_language: source_language.into(),
            target_languages,
            logger: StageLogger::new(Stage::Translate),
        }
    }

    fn request_for(&self, record: &TranscriptionRecord) -> TranslationJobRequest {
        TranslationJobRequest {
            job_name: record.job_name.replacen("Transcribe", "Translate", 1),
            input_uri: s3_uri(&self.bucket, &record.transcript_prefix()),
            output_uri: s3_uri(&self.bucket, &record.translation_prefix()),
            content_type: INPUT_CONTENT_TYPE.to_string(),
            target_languages: self.target_languages.codes(),
            source_language: self.source_language.clone(),
            role_arn: self.role_arn.clone(),
        }
    }

    /// Submit one job for all target languages and wait for it to finish.
    pub async fn translate(
        &self,
        record: TranscriptionRecord,
    ) -> WorkerResult<StageOutcome<TranslationRecord>> {
        let item = record.source().clone();
        let request = self.request_for(&record);

        self.logger.log_start(
            &item,
            &format!(
                "Translating {} into {}",
                request.input_uri,
                request.target_languages.join(",")
            ),
        );

        let job_id = match self.service.start_job(&request).await {
            Ok(job_id) => job_id,
            Err(e) => return Ok(self.skip(&item, e.to_string())),
        };

        let service = &self.service;
        let id = job_id.as_str();
        let description = match self.poller.wait_for(id, move || service.describe_job(id)).await {
            Ok(description) => description,
            Err(e) => {
                let err = e.into_worker_error(id);
                if err.is_fatal() {
                    return Err(err);
                }
                return Ok(self.skip(&item, err.to_string()));
            }
        };

        match description.outcome() {
            Some(JobOutcome::Succeeded) => {
                if description.state == TranslationJobState::CompletedWithError {
                    warn!(
                        item = %item,
                        job = id,
                        "Translation completed with errors: {}",
                        description.message.as_deref().unwrap_or("no details")
                    );
                }
                let output_prefix = description
                    .output_uri
                    .as_deref()
                    .and_then(|uri| key_prefix_from_uri(&self.bucket, uri))
                    .unwrap_or_else(|| {
                        record.translation_prefix().trim_end_matches('/').to_string()
                    });

                metrics::counter!("transx_translations_total", "result" => "completed")
                    .increment(1);
                self.logger
                    .log_progress(&item, &format!("Job {} wrote to {}", id, output_prefix));
                Ok(StageOutcome::Completed(TranslationRecord::new(record, output_prefix)))
            }
            Some(JobOutcome::Failed(reason)) => {
                metrics::counter!("transx_translations_total", "result" => "failed")
                    .increment(1);
                let err = WorkerError::job_failed(id, description.as_str(), reason);
                Ok(self.skip(&item, err.to_string()))
            }
            None => Ok(self.skip(
                &item,
                format!("job {} returned non-terminal state {}", id, description.as_str()),
            )),
        }
    }

    fn skip<T>(&self, item: &SourceItem, reason: impl Into<String>) -> StageOutcome<T> {
        let reason = SkipReason::new(Stage::Translate, item, reason);
        self.logger.log_skip(&reason);
        StageOutcome::Skipped(reason)
    }
}
