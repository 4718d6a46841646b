//! Content checksums used to skip uploads that are already in sync.
//!
//! S3 stores the base64 SHA-256 sent with an upload and returns it from a
//! checksum-enabled HEAD request, so local and remote values compare directly.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

use crate::error::{StorageError, StorageResult};

/// Base64 SHA-256 of an in-memory buffer.
pub fn sha256_base64(bytes: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(bytes))
}

/// Base64 SHA-256 of a file, streamed on the blocking pool.
pub async fn file_sha256(path: &Path) -> StorageResult<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(STANDARD.encode(hasher.finalize()))
    })
    .await
    .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
    .map_err(StorageError::from)
}
