//! Source video discovery.

use std::path::Path;

use tracing::{debug, warn};
use transx_models::SourceItem;
use walkdir::WalkDir;

use crate::error::{WorkerError, WorkerResult};

/// Recursively collect regular files under `root` with the given extension.
///
/// Matching is case-insensitive. Paths are absolute and sorted so a run
/// processes items in a stable order. A missing root is fatal; unreadable
/// entries below it are skipped.
pub fn discover(root: &Path, extension: &str) -> WorkerResult<Vec<SourceItem>> {
    let root = root
        .canonicalize()
        .map_err(|e| WorkerError::discovery(format!("{}: {}", root.display(), e)))?;
    if !root.is_dir() {
        return Err(WorkerError::discovery(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let wanted = extension.trim_start_matches('.');
    let mut items = Vec::new();

    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
        if matches {
            debug!(path = %entry.path().display(), "Discovered source video");
            items.push(SourceItem::new(entry.into_path()));
        }
    }

    items.sort();
    Ok(items)
}
