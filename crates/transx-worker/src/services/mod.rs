//! Remote service boundaries.
//!
//! Each trait is the narrow surface a stage needs from one cloud service.
//! The AWS implementations live in the submodules; tests substitute fakes.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_types::SdkConfig;
use transx_models::{JobOutcome, RemoteJobState, TranscriptionJobState, TranslationJobState};

use crate::error::ServiceResult;

pub mod iam;
pub mod transcribe;
pub mod translate;

pub use iam::AwsIdentity;
pub use transcribe::AwsTranscribe;
pub use translate::AwsTranslate;

/// Load the shared SDK configuration from the default provider chain.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

/// Parameters for one speech-to-text job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionJobRequest {
    pub job_name: String,
    /// `s3://bucket/key` of the uploaded video
    pub media_uri: String,
    /// Container format, e.g. `mp4`
    pub media_format: String,
    pub output_bucket: String,
    /// Key (without extension) the transcript and subtitles are written to
    pub output_key: String,
    /// Subtitle format, e.g. `srt`
    pub subtitle_format: String,
    /// Let the service detect the spoken languages
    pub identify_multiple_languages: bool,
}

/// Status snapshot of a speech-to-text job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionJobStatus {
    pub state: TranscriptionJobState,
    pub failure_reason: Option<String>,
    /// Languages identified in the media, once known.
    pub language_codes: Vec<String>,
}

impl RemoteJobState for TranscriptionJobStatus {
    fn as_str(&self) -> &str {
        self.state.as_str()
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    fn outcome(&self) -> Option<JobOutcome> {
        match (self.state.outcome()?, &self.failure_reason) {
            (JobOutcome::Failed(_), Some(reason)) => Some(JobOutcome::Failed(reason.clone())),
            (outcome, _) => Some(outcome),
        }
    }
}

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn start_job(&self, request: &TranscriptionJobRequest) -> ServiceResult<()>;

    async fn job_status(&self, job_name: &str) -> ServiceResult<TranscriptionJobStatus>;
}

/// Parameters for one multi-target translation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJobRequest {
    pub job_name: String,
    /// Directory-like `s3://` URI holding the documents to translate
    pub input_uri: String,
    pub output_uri: String,
    pub content_type: String,
    /// Every requested target language, submitted as one job
    pub target_languages: Vec<String>,
    pub source_language: String,
    /// Role the service assumes to read input and write output
    pub role_arn: String,
}

/// Status snapshot of a translation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJobDescription {
    pub state: TranslationJobState,
    /// Where the service actually wrote its output
    pub output_uri: Option<String>,
    pub message: Option<String>,
}

impl RemoteJobState for TranslationJobDescription {
    fn as_str(&self) -> &str {
        self.state.as_str()
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    fn outcome(&self) -> Option<JobOutcome> {
        match (self.state.outcome()?, &self.message) {
            (JobOutcome::Failed(_), Some(message)) => Some(JobOutcome::Failed(message.clone())),
            (outcome, _) => Some(outcome),
        }
    }
}

#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Submit a job and return its service-assigned id.
    async fn start_job(&self, request: &TranslationJobRequest) -> ServiceResult<String>;

    async fn describe_job(&self, job_id: &str) -> ServiceResult<TranslationJobDescription>;
}

/// Role lookup and creation.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Return the role's ARN, or [`crate::error::ServiceError::RoleNotFound`].
    async fn get_role(&self, name: &str) -> ServiceResult<String>;

    /// Create a role with the given trust policy and return its ARN.
    async fn create_role(&self, name: &str, trust_policy: &str) -> ServiceResult<String>;

    async fn attach_policy(&self, role_name: &str, policy_arn: &str) -> ServiceResult<()>;
}
