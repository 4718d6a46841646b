//! Target language codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing language codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("Empty language code")]
    Empty,

    #[error("Invalid language code: {0}")]
    Invalid(String),
}

/// A language code such as `PT`, `es` or `zh-TW`.
///
/// The code is kept as configured for submission to the translation service.
/// Comparison and artifact naming use the lower-case form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetLanguage {
    code: String,
    normalized: String,
}

impl TargetLanguage {
    pub fn new(code: &str) -> Result<Self, LanguageError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(LanguageError::Empty);
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(LanguageError::Invalid(code.to_string()));
        }
        Ok(Self {
            code: code.to_string(),
            normalized: code.to_ascii_lowercase(),
        })
    }

    /// Code as configured.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Lower-case code used for artifact keys and local file names.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl PartialEq for TargetLanguage {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for TargetLanguage {}

impl std::hash::Hash for TargetLanguage {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl FromStr for TargetLanguage {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TargetLanguage {
    type Error = LanguageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TargetLanguage> for String {
    fn from(value: TargetLanguage) -> Self {
        value.code
    }
}

/// Ordered set of target languages.
///
/// Duplicates are accepted when parsing; [`TargetLanguages::distinct`]
/// collapses them (case-insensitively) while keeping first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLanguages(Vec<TargetLanguage>);

impl TargetLanguages {
    pub fn new(languages: Vec<TargetLanguage>) -> Self {
        Self(languages)
    }

    /// Parse a comma-separated list such as `"PT,ES,CA"`.
    pub fn parse_list(list: &str) -> Result<Self, LanguageError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TargetLanguage::new)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetLanguage> {
        self.0.iter()
    }

    /// Languages with case-insensitive duplicates removed.
    pub fn distinct(&self) -> Vec<&TargetLanguage> {
        let mut seen = std::collections::HashSet::new();
        self.0.iter().filter(|l| seen.insert(l.normalized())).collect()
    }

    /// Codes as configured, deduplicated, for job submission.
    pub fn codes(&self) -> Vec<String> {
        self.distinct()
            .into_iter()
            .map(|l| l.code().to_string())
            .collect()
    }
}

impl FromStr for TargetLanguages {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_list(s)
    }
}

impl fmt::Display for TargetLanguages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.0.iter().map(|l| l.code()).collect();
        write!(f, "{}", codes.join(","))
    }
}
