use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::WordError;

/// Opaque identifier of a stored word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordId(Uuid);

impl WordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for WordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A persisted vocabulary entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: WordId,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub was_seen: bool,
}

impl Word {
    /// Build a fresh, unseen word. The name is trimmed and must not be empty.
    pub fn new(name: &str, timestamp: DateTime<Utc>) -> Result<Self, WordError> {
        Ok(Self {
            id: WordId::new(),
            name: validate_name(name)?,
            timestamp,
            was_seen: false,
        })
    }
}

/// Trim a candidate name, rejecting it when nothing is left.
pub fn validate_name(name: &str) -> Result<String, WordError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WordError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Orderings offered by the word list
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Created,
    Alpha,
    Seen,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            SortOrder::Created => SortOrder::Alpha,
            SortOrder::Alpha => SortOrder::Seen,
            SortOrder::Seen => SortOrder::Created,
        }
    }

    /// Total order used by [`SortOrder::apply`]. Equal keys fall back to creation time.
    pub fn compare(self, a: &Word, b: &Word) -> Ordering {
        let by_created = a.timestamp.cmp(&b.timestamp);
        match self {
            SortOrder::Created => by_created,
            SortOrder::Alpha => a.name.cmp(&b.name).then(by_created),
            // unseen first
            SortOrder::Seen => a.was_seen.cmp(&b.was_seen).then(by_created),
        }
    }

    /// Sort words that arrive in insertion order. The sort is stable, so
    /// words created within the same instant keep their insertion order.
    pub fn apply<I>(self, words: I) -> Vec<Word>
    where
        I: IntoIterator<Item = Word>,
    {
        words
            .into_iter()
            .sorted_by(|a, b| self.compare(a, b))
            .collect()
    }
}

/// Counts shown above the word list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordTally {
    pub total: usize,
    pub seen: usize,
    pub left: usize,
}

impl WordTally {
    pub fn of(words: &[Word]) -> Self {
        let seen = words.iter().filter(|w| w.was_seen).count();
        Self {
            total: words.len(),
            seen,
            left: words.len() - seen,
        }
    }
}
