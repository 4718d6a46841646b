//! Remote job states for transcription and translation jobs.
//!
//! The poller only needs to know whether a state is terminal. The stage
//! that owns the job reads the final state afterwards and decides whether
//! the item continues, via [`RemoteJobState::outcome`].

use serde::{Deserialize, Serialize};

/// How a terminal remote job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The job produced its artifacts.
    Succeeded,
    /// The job ended without usable artifacts.
    Failed(String),
}

/// Common view over remote job status values.
pub trait RemoteJobState {
    /// Status label as reported by the remote service.
    fn as_str(&self) -> &str;

    /// Check if this is a terminal state (no more updates expected).
    fn is_terminal(&self) -> bool;

    /// Outcome of a terminal state, `None` while the job is still running.
    fn outcome(&self) -> Option<JobOutcome>;
}

/// Speech-to-text job status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranscriptionJobState {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// A status value this client does not know about yet.
    Unknown(String),
}

impl TranscriptionJobState {
    /// Map the service's wire label onto a state.
    pub fn from_status_str(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "QUEUED" => Self::Queued,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            _ => Self::Unknown(status.to_string()),
        }
    }
}

impl RemoteJobState for TranscriptionJobState {
    fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Unknown(s) => s.as_str(),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn outcome(&self) -> Option<JobOutcome> {
        match self {
            Self::Completed => Some(JobOutcome::Succeeded),
            Self::Failed => Some(JobOutcome::Failed("transcription job failed".into())),
            _ => None,
        }
    }
}

impl std::fmt::Display for TranscriptionJobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Batch translation job status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranslationJobState {
    Submitted,
    InProgress,
    Completed,
    /// Finished, but some documents or languages failed.
    CompletedWithError,
    Failed,
    StopRequested,
    Stopped,
    Unknown(String),
}

impl TranslationJobState {
    pub fn from_status_str(status: &str) -> Self {
        match status.to_ascii_uppercase().as_str() {
            "SUBMITTED" => Self::Submitted,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "COMPLETED_WITH_ERROR" => Self::CompletedWithError,
            "FAILED" => Self::Failed,
            "STOP_REQUESTED" => Self::StopRequested,
            "STOPPED" => Self::Stopped,
            _ => Self::Unknown(status.to_string()),
        }
    }
}

impl RemoteJobState for TranslationJobState {
    fn as_str(&self) -> &str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::CompletedWithError => "COMPLETED_WITH_ERROR",
            Self::Failed => "FAILED",
            Self::StopRequested => "STOP_REQUESTED",
            Self::Stopped => "STOPPED",
            Self::Unknown(s) => s.as_str(),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithError | Self::Failed | Self::Stopped
        )
    }

    fn outcome(&self) -> Option<JobOutcome> {
        match self {
            // Partial output still lands per language; downloads sort out the rest.
            Self::Completed | Self::CompletedWithError => Some(JobOutcome::Succeeded),
            Self::Failed => Some(JobOutcome::Failed("translation job failed".into())),
            Self::Stopped => Some(JobOutcome::Failed("translation job was stopped".into())),
            _ => None,
        }
    }
}

impl std::fmt::Display for TranslationJobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
