//! Per-item pipeline stages.
//!
//! Each stage turns one record into the next. Recoverable failures come back
//! as [`StageOutcome::Skipped`]; only errors that must abort the run are
//! returned as `Err`.

use transx_models::{SkipReason, StageOutcome};

pub mod download;
pub mod transcription;
pub mod translation;
pub mod upload;

pub use download::{DownloadStage, LanguageDownload};
pub use transcription::TranscriptionStage;
pub use translation::TranslationStage;
pub use upload::UploadStage;

/// Survivors and casualties of one stage across the batch.
#[derive(Debug)]
pub struct StageBatch<T> {
    pub completed: Vec<T>,
    pub skipped: Vec<SkipReason>,
}

impl<T> Default for StageBatch<T> {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> StageBatch<T> {
    pub fn push(&mut self, outcome: StageOutcome<T>) {
        match outcome {
            StageOutcome::Completed(value) => self.completed.push(value),
            StageOutcome::Skipped(reason) => self.skipped.push(reason),
        }
    }

    pub fn survivors(&self) -> usize {
        self.completed.len()
    }
}
