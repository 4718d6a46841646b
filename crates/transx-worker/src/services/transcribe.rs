//! Amazon Transcribe client.

use async_trait::async_trait;
use aws_sdk_transcribe::error::DisplayErrorContext;
use aws_sdk_transcribe::types::{Media, MediaFormat, SubtitleFormat, Subtitles};
use aws_sdk_transcribe::Client;
use aws_types::SdkConfig;
use tracing::debug;
use transx_models::TranscriptionJobState;

use super::{TranscriptionJobRequest, TranscriptionJobStatus, TranscriptionService};
use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct AwsTranscribe {
    client: Client,
}

impl AwsTranscribe {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl TranscriptionService for AwsTranscribe {
    async fn start_job(&self, request: &TranscriptionJobRequest) -> ServiceResult<()> {
        debug!(job = %request.job_name, media = %request.media_uri, "Starting transcription job");

        let media = Media::builder().media_file_uri(&request.media_uri).build();
        let subtitles = Subtitles::builder()
            .formats(SubtitleFormat::from(request.subtitle_format.as_str()))
            .build();

        self.client
            .start_transcription_job()
            .transcription_job_name(&request.job_name)
            .identify_multiple_languages(request.identify_multiple_languages)
            .media(media)
            .media_format(MediaFormat::from(request.media_format.as_str()))
            .output_bucket_name(&request.output_bucket)
            .output_key(&request.output_key)
            .subtitles(subtitles)
            .send()
            .await
            .map_err(|e| ServiceError::transcription(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    async fn job_status(&self, job_name: &str) -> ServiceResult<TranscriptionJobStatus> {
        let output = self
            .client
            .get_transcription_job()
            .transcription_job_name(job_name)
            .send()
            .await
            .map_err(|e| ServiceError::transcription(DisplayErrorContext(&e).to_string()))?;

        let job = output
            .transcription_job()
            .ok_or_else(|| ServiceError::unexpected(format!("no job {} in response", job_name)))?;

        let state = job
            .transcription_job_status()
            .map(|s| TranscriptionJobState::from_status_str(s.as_str()))
            .unwrap_or_else(|| TranscriptionJobState::Unknown("MISSING".into()));

        let mut language_codes: Vec<String> = job
            .language_codes()
            .iter()
            .filter_map(|item| item.language_code())
            .map(|code| code.as_str().to_string())
            .collect();
        if language_codes.is_empty() {
            language_codes.extend(job.language_code().map(|code| code.as_str().to_string()));
        }

        Ok(TranscriptionJobStatus {
            state,
            failure_reason: job.failure_reason().map(str::to_string),
            language_codes,
        })
    }
}
