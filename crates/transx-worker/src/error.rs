//! Worker error types.

use std::time::Duration;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors raised at the transcription, translation and identity boundaries.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Expected during provisioning: triggers role creation.
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Transcription service error: {0}")]
    Transcription(String),

    #[error("Translation service error: {0}")]
    Translation(String),

    #[error("Identity service error: {0}")]
    Identity(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ServiceError {
    pub fn transcription(msg: impl Into<String>) -> Self {
        Self::Transcription(msg.into())
    }

    pub fn translation(msg: impl Into<String>) -> Self {
        Self::Translation(msg.into())
    }

    pub fn identity(msg: impl Into<String>) -> Self {
        Self::Identity(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("Job {job} did not finish within {elapsed:?}")]
    JobTimedOut { job: String, elapsed: Duration },

    #[error("Job {job} ended in state {status}: {reason}")]
    JobFailed {
        job: String,
        status: String,
        reason: String,
    },

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Storage error: {0}")]
    Storage(#[from] transx_storage::StorageError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provisioning(msg: impl Into<String>) -> Self {
        Self::Provisioning(msg.into())
    }

    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    pub fn job_failed(
        job: impl Into<String>,
        status: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::JobFailed {
            job: job.into(),
            status: status.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error must abort the whole run.
    ///
    /// Everything else only drops the affected item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WorkerError::Config(_)
                | WorkerError::Provisioning(_)
                | WorkerError::Discovery(_)
                | WorkerError::Cancelled(_)
        )
    }
}
