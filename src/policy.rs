use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{NexusError, Result};

pub const DEFAULT_MAX_LINES: usize = 1000;
pub const DEFAULT_REQUIRED_KEYWORDS: &[&str] = &["loadstring", "local", "luarmor"];
pub const DEFAULT_BANNED_WORDS: &[&str] = &["workink", "lootdest", "lootlabs", "linkvertise"];
pub const DEFAULT_LINK_PATTERN: &str = r"https?://\S+";
pub const DEFAULT_SAFE_CONTEXT_KEYWORDS: &[&str] =
    &["loadstring", "require", "local", "then", "if"];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Policy settings as stored on disk (`policy.json`).
///
/// Every field falls back to the built-in default, so a partial file only
/// overrides what it names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyFile {
    pub max_lines: usize,
    pub required_keywords: Vec<String>,
    pub banned_words: Vec<String>,
    pub link_pattern: String,
    pub safe_context_keywords: Vec<String>,
}

impl Default for PolicyFile {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            required_keywords: owned(DEFAULT_REQUIRED_KEYWORDS),
            banned_words: owned(DEFAULT_BANNED_WORDS),
            link_pattern: DEFAULT_LINK_PATTERN.to_string(),
            safe_context_keywords: owned(DEFAULT_SAFE_CONTEXT_KEYWORDS),
        }
    }
}

impl PolicyFile {
    /// Checks the settings and builds the immutable configuration used by
    /// the validator. Called once at startup.
    pub fn compile(&self) -> Result<PolicyConfiguration> {
        if self.max_lines == 0 {
            return Err(NexusError::Policy("maxLines must be at least 1".into()));
        }
        if self.required_keywords.is_empty() {
            return Err(NexusError::Policy(
                "requiredKeywords is empty, every script would be rejected".into(),
            ));
        }
        if self.safe_context_keywords.is_empty() {
            return Err(NexusError::Policy("safeContextKeywords is empty".into()));
        }
        ensure_no_blank("requiredKeywords", &self.required_keywords)?;
        ensure_no_blank("bannedWords", &self.banned_words)?;
        ensure_no_blank("safeContextKeywords", &self.safe_context_keywords)?;

        let link_pattern = Regex::new(&self.link_pattern)
            .map_err(|e| NexusError::Policy(format!("linkPattern does not compile: {e}")))?;
        // A pattern matching "" would flag every line.
        if link_pattern.is_match("") {
            return Err(NexusError::Policy(
                "linkPattern matches the empty string".into(),
            ));
        }

        let alternation = self
            .safe_context_keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let safe_context = Regex::new(&alternation)
            .map_err(|e| NexusError::Policy(format!("safeContextKeywords: {e}")))?;

        Ok(PolicyConfiguration {
            max_lines: self.max_lines,
            required_keywords: self.required_keywords.clone(),
            required_keywords_lower: lower_all(&self.required_keywords),
            banned_words: self.banned_words.clone(),
            banned_words_lower: lower_all(&self.banned_words),
            link_pattern,
            safe_context_keywords: self.safe_context_keywords.clone(),
            safe_context,
        })
    }
}

fn ensure_no_blank(field: &str, words: &[String]) -> Result<()> {
    match words.iter().position(|w| w.trim().is_empty()) {
        Some(idx) => Err(NexusError::Policy(format!("{field}[{idx}] is blank"))),
        None => Ok(()),
    }
}

fn lower_all(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Validated, read-only policy shared by every validation call.
#[derive(Clone, Debug)]
pub struct PolicyConfiguration {
    max_lines: usize,
    required_keywords: Vec<String>,
    required_keywords_lower: Vec<String>,
    banned_words: Vec<String>,
    banned_words_lower: Vec<String>,
    link_pattern: Regex,
    safe_context_keywords: Vec<String>,
    safe_context: Regex,
}

impl PolicyConfiguration {
    /// The built-in NEXUS upload policy.
    pub fn standard() -> Self {
        PolicyFile::default()
            .compile()
            .expect("built-in policy is valid")
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    pub fn required_keywords(&self) -> &[String] {
        &self.required_keywords
    }

    pub fn banned_words(&self) -> &[String] {
        &self.banned_words
    }

    pub fn safe_context_keywords(&self) -> &[String] {
        &self.safe_context_keywords
    }

    /// True if any required keyword occurs in `text`, ignoring case.
    pub(crate) fn has_required_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.required_keywords_lower
            .iter()
            .any(|k| lower.contains(k.as_str()))
    }

    /// Banned words (as configured) found in an already lower-cased line.
    pub(crate) fn banned_words_in<'a>(
        &'a self,
        lower_line: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.banned_words
            .iter()
            .zip(&self.banned_words_lower)
            .filter(move |(_, lower)| lower_line.contains(lower.as_str()))
            .map(|(word, _)| word.as_str())
    }

    pub(crate) fn has_link(&self, line: &str) -> bool {
        self.link_pattern.is_match(line)
    }

    pub(crate) fn has_safe_context(&self, line: &str) -> bool {
        self.safe_context.is_match(line)
    }

    /// Back to the on-disk form, e.g. for `nexus policy show`.
    pub fn to_file(&self) -> PolicyFile {
        PolicyFile {
            max_lines: self.max_lines,
            required_keywords: self.required_keywords.clone(),
            banned_words: self.banned_words.clone(),
            link_pattern: self.link_pattern.as_str().to_string(),
            safe_context_keywords: self.safe_context_keywords.clone(),
        }
    }
}

impl Default for PolicyConfiguration {
    fn default() -> Self {
        Self::standard()
    }
}
