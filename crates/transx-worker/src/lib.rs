//! Batch subtitle pipeline.
//!
//! This crate provides:
//! - Discovery of source videos under a directory
//! - Bucket and role provisioning
//! - Upload, transcription, translation and subtitle download stages
//! - Cancellable polling of long-running remote jobs
//! - Terminology fixes applied to downloaded subtitles
//! - Cleanup of generated files and the run's bucket

pub mod clean;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod poller;
pub mod provisioner;
pub mod retry;
pub mod services;
pub mod stages;
pub mod terms;

pub use clean::CleanReport;
pub use config::{PipelineConfig, PollPolicy};
pub use error::{ServiceError, ServiceResult, WorkerError, WorkerResult};
pub use logging::StageLogger;
pub use pipeline::{Pipeline, PipelineReport, PipelineServices};
pub use poller::{JobPoller, PollError};
pub use provisioner::{ProvisionedResources, ResourceProvisioner};
pub use terms::TermTable;
