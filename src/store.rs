use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::StoreError;
use crate::word::{Word, WordId, WordTally};

/// Durable collection of words consumed by the quiz and the list screen.
///
/// Every mutating call persists before it returns. A failed call leaves the
/// stored record exactly as it was.
pub trait WordStore {
    /// All words in creation order.
    fn list(&self) -> Result<Vec<Word>, StoreError>;

    fn get(&self, id: WordId) -> Result<Option<Word>, StoreError>;

    /// Create an unseen word. Empty names are rejected before anything is written.
    fn create(&mut self, name: &str) -> Result<Word, StoreError>;

    /// Write the seen flag and return the updated record.
    fn set_seen(&mut self, id: WordId, seen: bool) -> Result<Word, StoreError>;

    /// Flip the seen flag and return the updated record.
    fn toggle_seen(&mut self, id: WordId) -> Result<Word, StoreError>;

    /// Remove permanently.
    fn delete(&mut self, id: WordId) -> Result<(), StoreError>;

    fn unseen(&self) -> Result<Vec<Word>, StoreError> {
        Ok(self.list()?.into_iter().filter(|w| !w.was_seen).collect())
    }

    fn tally(&self) -> Result<WordTally, StoreError> {
        Ok(WordTally::of(&self.list()?))
    }
}

/// Creation timestamp that never runs behind the newest stored word.
pub(crate) fn next_timestamp(latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match latest {
        Some(latest) if latest > now => latest,
        _ => now,
    }
}

/// In-memory store used as a test double.
///
/// Writes can be made to fail with [`MemoryWordStore::set_failing`] and
/// lookups with [`MemoryWordStore::set_failing_reads`] to exercise error paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryWordStore {
    words: Vec<Word>,
    failing: bool,
    failing_reads: bool,
}

impl MemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for tests: a store pre-filled with unseen words.
    pub fn with_words<'a, I>(names: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut store = Self::new();
        for name in names {
            store.create(name)?;
        }
        Ok(store)
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn set_failing_reads(&mut self, failing: bool) {
        self.failing_reads = failing;
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }

    fn position(&self, id: WordId) -> Result<usize, StoreError> {
        self.words
            .iter()
            .position(|w| w.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

impl WordStore for MemoryWordStore {
    fn list(&self) -> Result<Vec<Word>, StoreError> {
        Ok(self.words.clone())
    }

    fn get(&self, id: WordId) -> Result<Option<Word>, StoreError> {
        if self.failing_reads {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.words.iter().find(|w| w.id == id).cloned())
    }

    fn create(&mut self, name: &str) -> Result<Word, StoreError> {
        let timestamp = next_timestamp(self.words.last().map(|w| w.timestamp));
        let word = Word::new(name, timestamp)?;
        self.check_writable()?;
        self.words.push(word.clone());
        debug!(id = %word.id, name = %word.name, "created word");
        Ok(word)
    }

    fn set_seen(&mut self, id: WordId, seen: bool) -> Result<Word, StoreError> {
        let idx = self.position(id)?;
        self.check_writable()?;
        self.words[idx].was_seen = seen;
        Ok(self.words[idx].clone())
    }

    fn toggle_seen(&mut self, id: WordId) -> Result<Word, StoreError> {
        let idx = self.position(id)?;
        let seen = !self.words[idx].was_seen;
        self.set_seen(id, seen)
    }

    fn delete(&mut self, id: WordId) -> Result<(), StoreError> {
        let idx = self.position(id)?;
        self.check_writable()?;
        self.words.remove(idx);
        debug!(%id, "deleted word");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WordError;
    use assert_matches::assert_matches;

    #[test]
    fn test_create_list_toggle_delete() {
        let mut store = MemoryWordStore::new();
        let apple = store.create("apple").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "apple");
        assert!(!listed[0].was_seen);

        let toggled = store.toggle_seen(apple.id).unwrap();
        assert!(toggled.was_seen);
        assert!(store.list().unwrap()[0].was_seen);

        store.delete(apple.id).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_create_empty_name_is_rejected_without_writing() {
        let mut store = MemoryWordStore::new();
        assert_matches!(
            store.create(""),
            Err(StoreError::Validation(WordError::EmptyName))
        );
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_is_in_creation_order() {
        let store = MemoryWordStore::with_words(["cat", "dog", "fish"]).unwrap();
        let words = store.list().unwrap();
        let names: Vec<_> = words.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["cat", "dog", "fish"]);
        assert!(words.windows(2).all(|p| p[0].timestamp <= p[1].timestamp));
    }

    #[test]
    fn test_failing_store_keeps_record_intact() {
        let mut store = MemoryWordStore::with_words(["cat"]).unwrap();
        let id = store.list().unwrap()[0].id;
        store.set_failing(true);

        assert_matches!(store.toggle_seen(id), Err(StoreError::Unavailable(_)));
        assert_matches!(store.delete(id), Err(StoreError::Unavailable(_)));
        assert_matches!(store.create("dog"), Err(StoreError::Unavailable(_)));

        let words = store.list().unwrap();
        assert_eq!(words.len(), 1);
        assert!(!words[0].was_seen);
    }

    #[test]
    fn test_unknown_id() {
        let mut store = MemoryWordStore::new();
        let id = WordId::new();
        assert_matches!(store.set_seen(id, true), Err(StoreError::NotFound(missing)) if missing == id);
        assert_eq!(store.get(id).unwrap(), None);
    }

    #[test]
    fn test_unseen_and_tally() {
        let mut store = MemoryWordStore::with_words(["a", "b", "c"]).unwrap();
        let first = store.list().unwrap()[0].id;
        store.set_seen(first, true).unwrap();

        let unseen: Vec<_> = store.unseen().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(unseen, vec!["b", "c"]);

        let tally = store.tally().unwrap();
        assert_eq!((tally.total, tally.seen, tally.left), (3, 1, 2));
    }

    #[test]
    fn test_next_timestamp_never_runs_backwards() {
        let future = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(next_timestamp(Some(future)), future);
        assert!(next_timestamp(None) <= Utc::now());
    }
}
