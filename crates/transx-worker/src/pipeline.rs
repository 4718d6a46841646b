//! Batch orchestration.
//!
//! A run moves the whole batch through each stage before starting the next:
//!
//! ```text
//! Discover -> EnsureResources -> UploadAll -> TranscribeAll
//!          -> TranslateAll -> DownloadAll -> Done
//! ```
//!
//! Items dropped by a stage never come back, so the batch only shrinks.
//! Only configuration, discovery, provisioning and cancellation errors abort
//! the run; everything else is recorded in the report.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};
use transx_models::{
    SkipReason, SourceItem, Stage, StageCounts, TranscriptionRecord, TranslationRecord,
    UploadRecord,
};
use transx_storage::{ObjectStore, S3Store};

use crate::clean::{clean_bucket, clean_local, CleanReport};
use crate::config::PipelineConfig;
use crate::discovery::discover;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::StageLogger;
use crate::poller::JobPoller;
use crate::provisioner::{ProvisionedResources, ResourceProvisioner};
use crate::services::{
    load_sdk_config, AwsIdentity, AwsTranscribe, AwsTranslate, IdentityService,
    TranscriptionService, TranslationService,
};
use crate::stages::{
    DownloadStage, StageBatch, TranscriptionStage, TranslationStage, UploadStage,
};
use crate::terms::TermTable;

/// Remote collaborators used by one run.
#[derive(Clone)]
pub struct PipelineServices {
    pub store: Arc<dyn ObjectStore>,
    pub transcription: Arc<dyn TranscriptionService>,
    pub translation: Arc<dyn TranslationService>,
    pub identity: Arc<dyn IdentityService>,
}

impl PipelineServices {
    /// AWS clients sharing one resolved SDK configuration.
    pub async fn aws() -> Self {
        let sdk_config = load_sdk_config().await;
        Self {
            store: Arc::new(S3Store::new(&sdk_config)),
            transcription: Arc::new(AwsTranscribe::new(&sdk_config)),
            translation: Arc::new(AwsTranslate::new(&sdk_config)),
            identity: Arc::new(AwsIdentity::new(&sdk_config)),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub bucket: String,
    pub counts: StageCounts,
    /// Subtitle files written beside their source videos
    pub subtitles: Vec<PathBuf>,
    /// Every dropped item and failed language, in stage order
    pub skipped: Vec<SkipReason>,
}

pub struct Pipeline {
    config: PipelineConfig,
    services: PipelineServices,
    terms: Arc<TermTable>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, services: PipelineServices) -> Self {
        Self {
            config,
            services,
            terms: Arc::new(TermTable::standard()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_terms(mut self, terms: TermTable) -> Self {
        self.terms = Arc::new(terms);
        self
    }

    /// Token that aborts any in-flight job wait when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fail with [`WorkerError::Cancelled`] once the token has fired.
    fn check_cancelled(&self, stage: Stage) -> WorkerResult<()> {
        if self.cancel.is_cancelled() {
            return Err(WorkerError::Cancelled(format!("at {} stage", stage)));
        }
        Ok(())
    }

    /// Videos a run would pick up, in processing order.
    pub fn discover(&self) -> WorkerResult<Vec<SourceItem>> {
        discover(&self.config.input_dir, &self.config.media_extension)
    }

    /// Remove generated files beside every discovered video and, when
    /// `remote` is set, the configured bucket with all its objects.
    pub async fn clean(&self, remote: bool) -> WorkerResult<CleanReport> {
        let items = self.discover()?;
        let mut report = CleanReport {
            files_removed: clean_local(&items, &self.config.subtitle_extension).await?,
            ..Default::default()
        };

        if remote {
            if let Some(objects) =
                clean_bucket(self.services.store.as_ref(), &self.config.bucket_name).await?
            {
                report.objects_removed = objects;
                report.bucket_removed = true;
            }
        }
        Ok(report)
    }

    /// Run the whole batch.
    pub async fn run(&self) -> WorkerResult<PipelineReport> {
        self.config.validate()?;

        let items = self.discover()?;
        info!(
            path = %self.config.input_dir.display(),
            "[{}] videos queued for transcription",
            items.len()
        );

        let mut report = PipelineReport {
            bucket: self.config.bucket_name.clone(),
            ..Default::default()
        };
        report.counts.discovered = items.len();
        if items.is_empty() {
            info!("Nothing to do");
            return Ok(report);
        }

        let resources = ResourceProvisioner::new(
            self.services.store.clone(),
            self.services.identity.clone(),
        )
        .provision(&self.config.bucket_name, &self.config.role_name)
        .await?;

        self.check_cancelled(Stage::Upload)?;
        let uploads = self.upload_all(&resources, &items).await?;
        report.counts.uploaded = uploads.survivors();
        report.skipped.extend(uploads.skipped);

        self.check_cancelled(Stage::Transcribe)?;
        let transcripts = self.transcribe_all(&resources, uploads.completed).await?;
        report.counts.transcribed = transcripts.survivors();
        report.skipped.extend(transcripts.skipped);

        self.check_cancelled(Stage::Translate)?;
        let translations = self.translate_all(&resources, transcripts.completed).await?;
        report.counts.translated = translations.survivors();
        report.skipped.extend(translations.skipped);

        self.check_cancelled(Stage::Download)?;
        let download = DownloadStage::new(
            self.services.store.clone(),
            resources.bucket.clone(),
            self.config.target_languages.clone(),
            self.config.subtitle_extension.clone(),
            self.terms.clone(),
        );
        for record in &translations.completed {
            self.check_cancelled(Stage::Download)?;
            for language in download.download_all(record).await {
                if !language.outcome.is_completed() {
                    report.counts.subtitles_failed += 1;
                }
                match language.outcome.into_result() {
                    Ok(path) => report.subtitles.push(path),
                    Err(reason) => report.skipped.push(reason),
                }
            }
        }
        report.counts.subtitles_written = report.subtitles.len();
        StageLogger::new(Stage::Download)
            .log_completion(report.counts.subtitles_written, "subtitles written");

        info!(
            failed = report.counts.subtitles_failed,
            skipped = report.skipped.len(),
            "Transx done"
        );
        Ok(report)
    }

    async fn upload_all(
        &self,
        resources: &ProvisionedResources,
        items: &[SourceItem],
    ) -> WorkerResult<StageBatch<UploadRecord>> {
        let stage = UploadStage::new(self.services.store.clone(), resources.bucket.clone())
            .with_force(self.config.force_upload);
        let logger = StageLogger::new(Stage::Upload);
        let mut batch = StageBatch::default();
        for item in items {
            self.check_cancelled(Stage::Upload)?;
            batch.push(stage.put(item).instrument(logger.create_span(item)).await);
        }
        logger.log_completion(batch.survivors(), "videos uploaded");
        Ok(batch)
    }

    async fn transcribe_all(
        &self,
        resources: &ProvisionedResources,
        uploads: Vec<UploadRecord>,
    ) -> WorkerResult<StageBatch<TranscriptionRecord>> {
        let stage = TranscriptionStage::new(
            self.services.transcription.clone(),
            JobPoller::new(self.config.transcription_poll, self.cancel.clone()),
            resources.bucket.clone(),
            self.config.media_extension.clone(),
            self.config.subtitle_extension.clone(),
        );
        let logger = StageLogger::new(Stage::Transcribe);
        let mut batch = StageBatch::default();
        for upload in uploads {
            self.check_cancelled(Stage::Transcribe)?;
            let span = logger.create_span(&upload.source);
            batch.push(stage.transcribe(upload).instrument(span).await?);
        }
        logger.log_completion(batch.survivors(), "transcriptions done");
        Ok(batch)
    }

    async fn translate_all(
        &self,
        resources: &ProvisionedResources,
        transcripts: Vec<TranscriptionRecord>,
    ) -> WorkerResult<StageBatch<TranslationRecord>> {
        let stage = TranslationStage::new(
            self.services.translation.clone(),
            JobPoller::new(self.config.translation_poll, self.cancel.clone()),
            resources.bucket.clone(),
            resources.role_arn.clone(),
            self.config.source_language.clone(),
            self.config.target_languages.clone(),
        );
        let logger = StageLogger::new(Stage::Translate);
        let mut batch = StageBatch::default();
        for transcript in transcripts {
            self.check_cancelled(Stage::Translate)?;
            let span = logger.create_span(transcript.source());
            batch.push(stage.translate(transcript).instrument(span).await?);
        }
        logger.log_completion(batch.survivors(), "translations done");
        Ok(batch)
    }
}
