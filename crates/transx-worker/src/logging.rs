//! Structured stage logging utilities.
//!
//! Gives every stage the same start/progress/skip/completion messages with
//! the stage name and item attached as tracing fields.

use tracing::{info, warn, Span};
use transx_models::{SkipReason, Stage};

/// Logger bound to one stage of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct StageLogger {
    stage: Stage,
}

impl StageLogger {
    pub fn new(stage: Stage) -> Self {
        Self { stage }
    }

    /// Log the start of work on one item.
    pub fn log_start(&self, item: &dyn std::fmt::Display, message: &str) {
        info!(
            stage = %self.stage,
            item = %item,
            "{}", message
        );
    }

    /// Log a progress update for one item.
    pub fn log_progress(&self, item: &dyn std::fmt::Display, message: &str) {
        info!(
            stage = %self.stage,
            item = %item,
            "Progress: {}", message
        );
    }

    /// Log an item (or one of its languages) being dropped.
    pub fn log_skip(&self, reason: &SkipReason) {
        warn!(
            stage = %self.stage,
            item = %reason.item,
            language = reason.language.as_deref().unwrap_or("-"),
            "Skipped: {}", reason.reason
        );
    }

    /// Log how many items survived this stage.
    pub fn log_completion(&self, survivors: usize, message: &str) {
        info!(
            stage = %self.stage,
            count = survivors,
            "[{}] {}", survivors, message
        );
    }

    /// Create a tracing span for one item in this stage.
    pub fn create_span(&self, item: &dyn std::fmt::Display) -> Span {
        tracing::info_span!(
            "stage",
            stage = %self.stage,
            item = %item
        )
    }
}

