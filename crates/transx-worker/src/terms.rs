//! Subtitle text fixups.
//!
//! An ordered table of regex substitutions applied to every downloaded
//! subtitle. Rules run in sequence, each on the previous rule's output.
//! Global rules run first, then the rules registered for the language.

use std::collections::HashMap;

use regex::Regex;

#[derive(Debug, Clone)]
struct TermRule {
    pattern: Regex,
    replacement: String,
}

impl TermRule {
    fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Regex replacement table keyed by language.
#[derive(Debug, Clone, Default)]
pub struct TermTable {
    global: Vec<TermRule>,
    by_language: HashMap<String, Vec<TermRule>>,
}

impl TermTable {
    /// A table with no rules; `fix` returns its input.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Timestamp and product-name corrections used by default.
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(r"(\d{2}:\d{2}:\d{2}),(\d{3})", "${1}.${2}")
            .and_then(|t| t.with_rule(r"\bQuercus\b", "Quarkus"))
            .and_then(|t| t.with_rule(r"\bQuus\b", "Quarkus"))
            .expect("built-in term patterns are valid")
    }

    /// Add a rule applied to every language.
    pub fn with_rule(mut self, pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        self.global.push(TermRule::new(pattern, replacement)?);
        Ok(self)
    }

    /// Add a rule applied only to `language` (case-insensitive).
    pub fn with_language_rule(
        mut self,
        language: &str,
        pattern: &str,
        replacement: &str,
    ) -> Result<Self, regex::Error> {
        self.by_language
            .entry(language.to_ascii_lowercase())
            .or_default()
            .push(TermRule::new(pattern, replacement)?);
        Ok(self)
    }

    /// Apply global rules, then the language's rules.
    pub fn fix(&self, language: &str, text: &str) -> String {
        let language_rules = self
            .by_language
            .get(&language.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default();

        self.global
            .iter()
            .chain(language_rules)
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }
}
