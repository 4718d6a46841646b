//! S3 storage client.
//!
//! This crate provides:
//! - The [`ObjectStore`] boundary used by the pipeline stages
//! - File upload with SHA-256 checksums and byte download against S3
//! - Object listing and deletion for cleanup
//! - Bucket listing, creation and deletion

pub mod checksum;
pub mod client;
pub mod error;

pub use checksum::{file_sha256, sha256_base64};
pub use client::{ObjectStore, S3Store};
pub use error::{StorageError, StorageResult};
