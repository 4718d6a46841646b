//! Per-language subtitle download.
//!
//! Fans each translation out into one download per target language. Every
//! language succeeds or fails on its own; a failed write for one language
//! never stops the next one.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;
use transx_models::{
    artifact_key, subtitle_file_name, SkipReason, Stage, StageOutcome, TargetLanguage,
    TargetLanguages, TranslationRecord,
};
use transx_storage::ObjectStore;

use crate::error::WorkerResult;
use crate::logging::StageLogger;
use crate::retry::{retry_async, RetryConfig};
use crate::terms::TermTable;

/// Result of fetching one language for one item.
#[derive(Debug)]
pub struct LanguageDownload {
    pub language: TargetLanguage,
    /// Path of the written subtitle file.
    pub outcome: StageOutcome<PathBuf>,
}

pub struct DownloadStage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    languages: TargetLanguages,
    extension: String,
    terms: Arc<TermTable>,
    retry: RetryConfig,
    logger: StageLogger,
}

impl DownloadStage {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        languages: TargetLanguages,
        extension: impl Into<String>,
        terms: Arc<TermTable>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            languages,
            extension: extension.into(),
            terms,
            retry: RetryConfig::new("subtitle download"),
            logger: StageLogger::new(Stage::Download),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Download, fix up and write one subtitle per distinct target language.
    pub async fn download_all(&self, record: &TranslationRecord) -> Vec<LanguageDownload> {
        let mut downloads = Vec::with_capacity(self.languages.len());

        for language in self.languages.distinct() {
            let outcome = match self.download_language(record, language).await {
                Ok(path) => {
                    metrics::counter!("transx_subtitles_total", "result" => "written").increment(1);
                    self.logger.log_progress(
                        record.source(),
                        &format!("Wrote {} subtitle to {}", language.normalized(), path.display()),
                    );
                    StageOutcome::Completed(path)
                }
                Err(e) => {
                    metrics::counter!("transx_subtitles_total", "result" => "failed").increment(1);
                    let reason = SkipReason::new(Stage::Download, record.source(), e.to_string())
                        .with_language(language.normalized());
                    self.logger.log_skip(&reason);
                    StageOutcome::Skipped(reason)
                }
            };
            downloads.push(LanguageDownload {
                language: language.clone(),
                outcome,
            });
        }

        downloads
    }

    async fn download_language(
        &self,
        record: &TranslationRecord,
        language: &TargetLanguage,
    ) -> WorkerResult<PathBuf> {
        let key = artifact_key(
            &record.output_prefix,
            language,
            record.media_key(),
            &self.extension,
        );

        let store = &self.store;
        let bucket = self.bucket.as_str();
        let object_key = key.as_str();
        let bytes = retry_async(&self.retry, move || store.get_object(bucket, object_key)).await?;

        let contents = match String::from_utf8(bytes) {
            Ok(text) => self.terms.fix(language.normalized(), &text).into_bytes(),
            Err(e) => {
                warn!(key = %key, "Subtitle is not UTF-8, writing it unmodified");
                e.into_bytes()
            }
        };

        let path = record.source().directory().join(subtitle_file_name(
            record.media_key(),
            language,
            &self.extension,
        ));
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}
