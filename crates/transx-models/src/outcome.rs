//! Stage outcomes.
//!
//! A per-item stage either completes with the next record or skips the item
//! with a reason. Skipped items never re-enter later stages, so the batch
//! only shrinks.

use serde::{Deserialize, Serialize};

/// Pipeline stages that act on individual items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Upload,
    Transcribe,
    Translate,
    Download,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Transcribe => "transcribe",
            Stage::Translate => "translate",
            Stage::Download => "download",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an item (or one language of an item) was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipReason {
    pub stage: Stage,
    /// Source path of the affected item.
    pub item: String,
    /// Set for per-language download failures.
    pub language: Option<String>,
    pub reason: String,
}

impl SkipReason {
    pub fn new(stage: Stage, item: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            stage,
            item: item.to_string(),
            language: None,
            reason: reason.into(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.language {
            Some(lang) => write!(f, "[{}] {} ({}): {}", self.stage, self.item, lang, self.reason),
            None => write!(f, "[{}] {}: {}", self.stage, self.item, self.reason),
        }
    }
}

/// Result of running one stage on one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Completed(T),
    Skipped(SkipReason),
}

impl<T> StageOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, StageOutcome::Completed(_))
    }

    pub fn into_result(self) -> Result<T, SkipReason> {
        match self {
            StageOutcome::Completed(v) => Ok(v),
            StageOutcome::Skipped(reason) => Err(reason),
        }
    }
}

/// Items that survived each stage boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub discovered: usize,
    pub uploaded: usize,
    pub transcribed: usize,
    pub translated: usize,
    /// Subtitle files written, one per (item, language).
    pub subtitles_written: usize,
    pub subtitles_failed: usize,
}

impl StageCounts {
    /// Item counts never grow from one stage to the next.
    pub fn is_monotonic(&self) -> bool {
        self.discovered >= self.uploaded
            && self.uploaded >= self.transcribed
            && self.transcribed >= self.translated
    }
}
