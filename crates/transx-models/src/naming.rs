//! Remote key, job name and local file name derivation.
//!
//! Every downstream artifact path is derived from the media key, so these
//! functions must stay deterministic.

use std::path::Path;

use url::Url;

use crate::language::TargetLanguage;

/// Replace every character outside `[0-9A-Za-z._-]` with `_`.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn key_stem(remote_key: &str) -> &str {
    Path::new(remote_key)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(remote_key)
}

/// Sanitized stem of the remote key, the base for all artifact paths.
pub fn media_key(remote_key: &str) -> String {
    sanitize(key_stem(remote_key))
}

/// Longest job name the transcription service accepts.
pub const MAX_JOB_NAME_LEN: usize = 200;

const JOB_NAME_PREFIX: &str = "Transcribe_";

/// Job name unique per submission: `Transcribe_{stem}_{millis}`, sanitized.
///
/// The stem is shortened so the name fits [`MAX_JOB_NAME_LEN`] with the
/// timestamp suffix intact.
pub fn transcription_job_name(remote_key: &str, submitted_at_millis: i64) -> String {
    let suffix = format!("_{}", submitted_at_millis);
    let room = MAX_JOB_NAME_LEN.saturating_sub(JOB_NAME_PREFIX.len() + suffix.len());
    let stem: String = key_stem(remote_key).chars().take(room).collect();
    sanitize(&format!("{}{}{}", JOB_NAME_PREFIX, stem, suffix))
}

/// `s3://{bucket}/{key}`
pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key.trim_start_matches('/'))
}

/// Reduce an `s3://bucket/prefix/` URI to `prefix` inside `bucket`.
///
/// Returns `None` when the URI is not an S3 URI or points at another bucket.
pub fn key_prefix_from_uri(bucket: &str, uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "s3" || url.host_str()? != bucket {
        return None;
    }
    Some(url.path().trim_matches('/').to_string())
}

/// Per-language artifact key: `{prefix}/{lang}.{media_key}.{ext}`.
pub fn artifact_key(
    prefix: &str,
    language: &TargetLanguage,
    media_key: &str,
    extension: &str,
) -> String {
    let name = format!("{}.{}.{}", language.normalized(), media_key, extension);
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Local subtitle file name: `{media_key}.{lang}.{ext}`.
pub fn subtitle_file_name(
    media_key: &str,
    language: &TargetLanguage,
    extension: &str,
) -> String {
    format!("{}.{}.{}", media_key, language.normalized(), extension)
}

/// Whether `file_name` looks like a subtitle written for `media_key`,
/// for any language code.
pub fn is_subtitle_file_name(file_name: &str, media_key: &str, extension: &str) -> bool {
    let code = file_name
        .strip_prefix(media_key)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(extension))
        .and_then(|rest| rest.strip_suffix('.'));
    match code {
        Some(code) => {
            !code.is_empty()
                && code
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        }
        None => false,
    }
}

/// Local job info file name: `{media_key}.transcribe.json`.
pub fn job_info_file_name(media_key: &str) -> String {
    format!("{}.transcribe.json", media_key)
}
