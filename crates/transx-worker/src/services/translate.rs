//! Amazon Translate batch client.

use async_trait::async_trait;
use aws_sdk_translate::error::DisplayErrorContext;
use aws_sdk_translate::types::{InputDataConfig, OutputDataConfig};
use aws_sdk_translate::Client;
use aws_types::SdkConfig;
use tracing::debug;
use transx_models::TranslationJobState;

use super::{TranslationJobDescription, TranslationJobRequest, TranslationService};
use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct AwsTranslate {
    client: Client,
}

impl AwsTranslate {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl TranslationService for AwsTranslate {
    async fn start_job(&self, request: &TranslationJobRequest) -> ServiceResult<String> {
        debug!(
            job = %request.job_name,
            input = %request.input_uri,
            languages = ?request.target_languages,
            "Starting translation job"
        );

        let input = InputDataConfig::builder()
            .s3_uri(&request.input_uri)
            .content_type(&request.content_type)
            .build()
            .map_err(|e| ServiceError::translation(e.to_string()))?;
        let output = OutputDataConfig::builder()
            .s3_uri(&request.output_uri)
            .build()
            .map_err(|e| ServiceError::translation(e.to_string()))?;

        let response = self
            .client
            .start_text_translation_job()
            .job_name(&request.job_name)
            .input_data_config(input)
            .output_data_config(output)
            .set_target_language_codes(Some(request.target_languages.clone()))
            .source_language_code(&request.source_language)
            .data_access_role_arn(&request.role_arn)
            .send()
            .await
            .map_err(|e| ServiceError::translation(DisplayErrorContext(&e).to_string()))?;

        response
            .job_id()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::unexpected("translation job accepted without a job id"))
    }

    async fn describe_job(&self, job_id: &str) -> ServiceResult<TranslationJobDescription> {
        let output = self
            .client
            .describe_text_translation_job()
            .job_id(job_id)
            .send()
            .await
            .map_err(|e| ServiceError::translation(DisplayErrorContext(&e).to_string()))?;

        let props = output.text_translation_job_properties().ok_or_else(|| {
            ServiceError::unexpected(format!("no properties for translation job {}", job_id))
        })?;

        let state = props
            .job_status()
            .map(|s| TranslationJobState::from_status_str(s.as_str()))
            .unwrap_or_else(|| TranslationJobState::Unknown("MISSING".into()));

        Ok(TranslationJobDescription {
            state,
            output_uri: props.output_data_config().map(|c| c.s3_uri().to_string()),
            message: props.message().map(str::to_string),
        })
    }
}
