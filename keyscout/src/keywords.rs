use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::errors::{ScanError, ScanOutcome};

/// A single search term, matched as a case-insensitive substring
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Keyword {
    text: String,
    folded: String,
}

impl Keyword {
    /// Creates a keyword, rejecting empty or whitespace-only input
    pub fn new(text: impl Into<String>) -> ScanOutcome<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ScanError::invalid_keyword(text));
        }
        let folded = text.to_lowercase();
        Ok(Self { text, folded })
    }

    /// The keyword as the user wrote it
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The lower-cased form used for matching
    pub fn folded(&self) -> &str {
        &self.folded
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for Keyword {
    type Error = ScanError;

    fn try_from(text: String) -> ScanOutcome<Self> {
        Self::new(text)
    }
}

impl From<Keyword> for String {
    fn from(keyword: Keyword) -> Self {
        keyword.text
    }
}

/// The ordered keyword list for one run.
///
/// Keywords that fold to the same lower-case form are collapsed into the first
/// spelling seen, so every keyword has exactly one report entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
}

impl KeywordSet {
    /// Builds a set from raw strings, dropping duplicates
    pub fn new<I, S>(keywords: I) -> ScanOutcome<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for text in keywords {
            set.insert(Keyword::new(text)?);
        }
        Ok(set)
    }

    /// Parses comma-separated input. Entries are trimmed and empty ones discarded.
    pub fn parse(input: &str) -> Self {
        let mut set = Self::default();
        for text in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Ok(keyword) = Keyword::new(text) {
                set.insert(keyword);
            }
        }
        set
    }

    /// Adds a keyword unless one with the same folded form is already present.
    /// Returns whether it was added.
    pub fn insert(&mut self, keyword: Keyword) -> bool {
        if self.keywords.iter().any(|k| k.folded == keyword.folded) {
            debug!("Dropping duplicate keyword '{}'", keyword);
            return false;
        }
        self.keywords.push(keyword);
        true
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keyword> {
        self.keywords.iter()
    }

    /// Position of a keyword, matched case-insensitively
    pub fn position(&self, keyword: &str) -> Option<usize> {
        let folded = keyword.to_lowercase();
        self.keywords.iter().position(|k| k.folded == folded)
    }

    pub fn get(&self, index: usize) -> Option<&Keyword> {
        self.keywords.get(index)
    }
}

impl<'a> IntoIterator for &'a KeywordSet {
    type Item = &'a Keyword;
    type IntoIter = std::slice::Iter<'a, Keyword>;

    fn into_iter(self) -> Self::IntoIter {
        self.keywords.iter()
    }
}
