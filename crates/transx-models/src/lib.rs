//! Shared data models for the transx pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Discovered source videos and the per-stage records derived from them
//! - Target language sets
//! - Remote job states and their terminal outcomes
//! - Stage outcomes, skip reasons and stage counts
//! - Remote key and job name derivation

pub mod job_status;
pub mod language;
pub mod naming;
pub mod outcome;
pub mod record;

// Re-export common types
pub use job_status::{JobOutcome, RemoteJobState, TranscriptionJobState, TranslationJobState};
pub use language::{LanguageError, TargetLanguage, TargetLanguages};
pub use naming::{
    artifact_key, is_subtitle_file_name, job_info_file_name, key_prefix_from_uri, media_key,
    s3_uri, sanitize, subtitle_file_name, transcription_job_name, MAX_JOB_NAME_LEN,
};
pub use outcome::{SkipReason, Stage, StageCounts, StageOutcome};
pub use record::{
    SourceItem, TranscriptionJobInfo, TranscriptionRecord, TranslationRecord, UploadRecord,
};
