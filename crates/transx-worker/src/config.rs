//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use transx_models::TargetLanguages;

use crate::error::{WorkerError, WorkerResult};

/// Timing policy for waiting on one kind of remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total budget, measured from the start of the wait.
    pub timeout: Duration,
    /// Delay before the first status check.
    pub initial_delay: Duration,
    /// Delay between status checks.
    pub interval: Duration,
    /// Consecutive status check errors tolerated before the wait gives up.
    pub max_check_failures: u32,
}

impl PollPolicy {
    pub fn new(timeout: Duration, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            initial_delay,
            interval,
            max_check_failures: 3,
        }
    }

    /// Short-lived speech-to-text jobs: 5 minutes, polled every 15 seconds.
    pub fn transcription() -> Self {
        Self::new(
            Duration::from_secs(300),
            Duration::ZERO,
            Duration::from_secs(15),
        )
    }

    /// Slow batch translation jobs: 45 minutes, first poll after a minute, then every 30 seconds.
    pub fn translation() -> Self {
        Self::new(
            Duration::from_secs(2700),
            Duration::from_secs(60),
            Duration::from_secs(30),
        )
    }

    fn validate(&self, name: &str) -> WorkerResult<()> {
        if self.interval.is_zero() {
            return Err(WorkerError::config_error(format!(
                "{} poll interval must be greater than zero",
                name
            )));
        }
        if self.interval > self.timeout {
            return Err(WorkerError::config_error(format!(
                "{} poll interval {:?} exceeds timeout {:?}",
                name, self.interval, self.timeout
            )));
        }
        Ok(())
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned recursively for source videos
    pub input_dir: PathBuf,
    /// Storage bucket for uploads and job output
    pub bucket_name: String,
    /// Ordered target languages for translation
    pub target_languages: TargetLanguages,
    /// Language spoken in the source videos
    pub source_language: String,
    /// Role the translation service assumes to read and write the bucket
    pub role_name: String,
    /// Extension of the source videos to pick up
    pub media_extension: String,
    /// Extension of the subtitle artifacts
    pub subtitle_extension: String,
    pub transcription_poll: PollPolicy,
    pub translation_poll: PollPolicy,
    /// Upload every video even when the bucket already holds an identical copy
    pub force_upload: bool,
}

/// Unique per run unless a bucket name is configured.
pub fn generated_bucket_name() -> String {
    format!("transx-bucket-{}", chrono::Utc::now().timestamp_millis())
}

fn default_input_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            bucket_name: generated_bucket_name(),
            target_languages: TargetLanguages::parse_list("PT,ES,CA").unwrap_or_default(),
            source_language: "EN".to_string(),
            role_name: "TransxRole".to_string(),
            media_extension: "mp4".to_string(),
            subtitle_extension: "srt".to_string(),
            transcription_poll: PollPolicy::transcription(),
            translation_poll: PollPolicy::translation(),
            force_upload: false,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::default();

        let target_languages = match std::env::var("TRANSX_TARGET_LANGUAGES") {
            Ok(list) => TargetLanguages::parse_list(&list)
                .map_err(|e| {
                    WorkerError::config_error(format!("TRANSX_TARGET_LANGUAGES: {}", e))
                })?,
            Err(_) => defaults.target_languages,
        };

        let transcription_poll = PollPolicy {
            timeout: env_secs(
                "TRANSX_TRANSCRIBE_TIMEOUT_SECS",
                defaults.transcription_poll.timeout,
            ),
            interval: env_secs(
                "TRANSX_TRANSCRIBE_INTERVAL_SECS",
                defaults.transcription_poll.interval,
            ),
            ..defaults.transcription_poll
        };

        let translation_poll = PollPolicy {
            timeout: env_secs(
                "TRANSX_TRANSLATE_TIMEOUT_SECS",
                defaults.translation_poll.timeout,
            ),
            initial_delay: env_secs(
                "TRANSX_TRANSLATE_INITIAL_DELAY_SECS",
                defaults.translation_poll.initial_delay,
            ),
            interval: env_secs(
                "TRANSX_TRANSLATE_INTERVAL_SECS",
                defaults.translation_poll.interval,
            ),
            ..defaults.translation_poll
        };

        Ok(Self {
            input_dir: std::env::var("TRANSX_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.input_dir),
            bucket_name: std::env::var("TRANSX_BUCKET_NAME").unwrap_or(defaults.bucket_name),
            target_languages,
            source_language: std::env::var("TRANSX_SOURCE_LANGUAGE")
                .unwrap_or(defaults.source_language),
            role_name: std::env::var("TRANSX_ROLE_NAME").unwrap_or(defaults.role_name),
            media_extension: std::env::var("TRANSX_MEDIA_EXTENSION")
                .unwrap_or(defaults.media_extension),
            subtitle_extension: defaults.subtitle_extension,
            transcription_poll,
            translation_poll,
            force_upload: env_flag("TRANSX_FORCE_UPLOAD"),
        })
    }

    /// Reject configurations that cannot produce a useful run.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.target_languages.is_empty() {
            return Err(WorkerError::config_error("no target languages configured"));
        }
        if self.source_language.trim().is_empty() {
            return Err(WorkerError::config_error("source language is empty"));
        }
        if self.bucket_name.trim().is_empty() {
            return Err(WorkerError::config_error("bucket name is empty"));
        }
        self.transcription_poll.validate("transcription")?;
        self.translation_poll.validate("translation")?;
        Ok(())
    }
}
