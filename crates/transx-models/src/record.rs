//! Per-item records produced by each pipeline stage.
//!
//! Each record wraps the one before it, so a [`TranslationRecord`] still
//! knows the source video it came from. Records are never mutated after
//! the stage that produced them returns.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A discovered local video file. Identity is the absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceItem {
    path: PathBuf,
}

impl SourceItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the file, used as the remote key.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Directory holding the video; subtitles are written here.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

impl std::fmt::Display for SourceItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// A source video that now exists in remote storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub source: SourceItem,
    /// Object key, the file's base name.
    pub remote_key: String,
}

impl UploadRecord {
    pub fn new(source: SourceItem, remote_key: impl Into<String>) -> Self {
        Self {
            source,
            remote_key: remote_key.into(),
        }
    }
}

/// Job summary written beside a video once its transcription completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranscriptionJobInfo {
    pub transcription_job_name: String,
    /// Languages the service identified in the media.
    pub language_codes: Vec<String>,
}

/// An upload whose speech-to-text job finished successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionRecord {
    pub upload: UploadRecord,
    pub job_name: String,
    /// Sanitized stem, base for every downstream artifact path.
    pub media_key: String,
}

impl TranscriptionRecord {
    pub fn new(
        upload: UploadRecord,
        job_name: impl Into<String>,
        media_key: impl Into<String>,
    ) -> Self {
        Self {
            upload,
            job_name: job_name.into(),
            media_key: media_key.into(),
        }
    }

    pub fn source(&self) -> &SourceItem {
        &self.upload.source
    }

    /// Key prefix holding the transcription output.
    pub fn transcript_prefix(&self) -> String {
        format!("{}/transcribe/", self.job_name)
    }

    /// Key prefix the translation job writes to.
    pub fn translation_prefix(&self) -> String {
        format!("{}/translate/", self.job_name)
    }
}

/// A transcription whose multi-language translation job finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub transcription: TranscriptionRecord,
    /// Key prefix holding one artifact per target language.
    pub output_prefix: String,
}

impl TranslationRecord {
    pub fn new(transcription: TranscriptionRecord, output_prefix: impl Into<String>) -> Self {
        Self {
            transcription,
            output_prefix: output_prefix.into(),
        }
    }

    pub fn media_key(&self) -> &str {
        &self.transcription.media_key
    }

    pub fn source(&self) -> &SourceItem {
        self.transcription.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation() -> TranslationRecord {
        let upload = UploadRecord::new(SourceItem::new("/videos/talks/clip1.mp4"), "clip1.mp4");
        let transcription = TranscriptionRecord::new(upload, "Transcribe_clip1_1", "clip1");
        TranslationRecord::new(transcription, "Transcribe_clip1_1/translate")
    }

    #[test]
    fn test_source_item_paths() {
        let item = SourceItem::new("/videos/talks/clip1.mp4");
        assert_eq!(item.file_name(), Some("clip1.mp4"));
        assert_eq!(item.directory(), Path::new("/videos/talks"));
    }

    #[test]
    fn test_records_chain_back_to_source() {
        let record = translation();
        assert_eq!(record.media_key(), "clip1");
        assert_eq!(record.source().path(), Path::new("/videos/talks/clip1.mp4"));
        assert_eq!(
            record.transcription.translation_prefix(),
            "Transcribe_clip1_1/translate/"
        );
    }

    #[test]
    fn test_records_serialize() {
        let json = serde_json::to_value(translation()).unwrap();
        assert_eq!(json["transcription"]["upload"]["remote_key"], "clip1.mp4");
    }

    #[test]
    fn test_job_info_uses_service_field_names() {
        let info = TranscriptionJobInfo {
            transcription_job_name: "Transcribe_clip1_1".into(),
            language_codes: vec!["en-US".into()],
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["TranscriptionJobName"], "Transcribe_clip1_1");
        assert_eq!(json["LanguageCodes"][0], "en-US");
    }
}
