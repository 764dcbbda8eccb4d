use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::store::{next_timestamp, WordStore};
use crate::word::{validate_name, Word, WordId};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS words (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        was_seen BOOLEAN NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_words_created_at ON words(created_at);
"#;

const SELECT_WORD: &str = "SELECT id, name, created_at, was_seen FROM words";

/// SQLite-backed word store
#[derive(Debug)]
pub struct WordDb {
    conn: Connection,
}

impl WordDb {
    /// Open the database at the default location, creating it if needed
    pub fn new() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("wordgame.db"));
        Self::open(path)
    }

    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!(path = %path.display(), "opening word database");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(WordDb { conn })
    }

    /// Timestamps are stored in a fixed-width RFC 3339 form so text order matches time order.
    fn encode_timestamp(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn word_from_row(row: &Row<'_>) -> rusqlite::Result<Word> {
        let id_str: String = row.get(0)?;
        let id = id_str.parse::<WordId>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let ts_str: String = row.get(2)?;
        let timestamp = DateTime::parse_from_rfc3339(&ts_str)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .with_timezone(&Utc);

        Ok(Word {
            id,
            name: row.get(1)?,
            timestamp,
            was_seen: row.get(3)?,
        })
    }

    fn fetch(conn: &Connection, id: WordId) -> rusqlite::Result<Option<Word>> {
        conn.query_row(
            &format!("{SELECT_WORD} WHERE id = ?1"),
            [id.to_string()],
            Self::word_from_row,
        )
        .optional()
    }
}

impl WordStore for WordDb {
    fn list(&self) -> Result<Vec<Word>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_WORD} ORDER BY created_at ASC, seq ASC"))?;
        let rows = stmt.query_map([], Self::word_from_row)?;

        let mut words = Vec::new();
        for word in rows {
            words.push(word?);
        }
        Ok(words)
    }

    fn get(&self, id: WordId) -> Result<Option<Word>, StoreError> {
        Ok(Self::fetch(&self.conn, id)?)
    }

    fn create(&mut self, name: &str) -> Result<Word, StoreError> {
        let name = validate_name(name)?;
        let tx = self.conn.transaction()?;

        let latest: Option<String> =
            tx.query_row("SELECT MAX(created_at) FROM words", [], |row| row.get(0))?;
        let latest = latest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|ts| ts.with_timezone(&Utc));

        let word = Word::new(&name, next_timestamp(latest).trunc_subsecs(6))?;
        tx.execute(
            "INSERT INTO words (id, name, created_at, was_seen) VALUES (?1, ?2, ?3, ?4)",
            params![
                word.id.to_string(),
                word.name,
                Self::encode_timestamp(&word.timestamp),
                word.was_seen,
            ],
        )?;
        tx.commit()?;

        debug!(id = %word.id, name = %word.name, "created word");
        Ok(word)
    }

    fn set_seen(&mut self, id: WordId, seen: bool) -> Result<Word, StoreError> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE words SET was_seen = ?1 WHERE id = ?2",
            params![seen, id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        let word = Self::fetch(&tx, id)?.ok_or(StoreError::NotFound(id))?;
        tx.commit()?;
        Ok(word)
    }

    fn toggle_seen(&mut self, id: WordId) -> Result<Word, StoreError> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE words SET was_seen = NOT was_seen WHERE id = ?1",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        let word = Self::fetch(&tx, id)?.ok_or(StoreError::NotFound(id))?;
        tx.commit()?;
        debug!(%id, seen = word.was_seen, "toggled word");
        Ok(word)
    }

    fn delete(&mut self, id: WordId) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM words WHERE id = ?1", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!(%id, "deleted word");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WordError;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn create_test_db() -> WordDb {
        WordDb::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_list() {
        let mut db = create_test_db();
        let apple = db.create("apple").unwrap();

        let words = db.list().unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0], apple);
        assert!(!words[0].was_seen);
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let mut db = create_test_db();
        assert_matches!(
            db.create("  "),
            Err(StoreError::Validation(WordError::EmptyName))
        );
        assert!(db.list().unwrap().is_empty());
    }

    #[test]
    fn test_toggle_and_set_seen() {
        let mut db = create_test_db();
        let word = db.create("dog").unwrap();

        assert!(db.toggle_seen(word.id).unwrap().was_seen);
        assert!(db.get(word.id).unwrap().unwrap().was_seen);
        assert!(!db.toggle_seen(word.id).unwrap().was_seen);

        assert!(db.set_seen(word.id, true).unwrap().was_seen);
        // idempotent
        assert!(db.set_seen(word.id, true).unwrap().was_seen);
    }

    #[test]
    fn test_delete() {
        let mut db = create_test_db();
        let keep = db.create("keep").unwrap();
        let drop = db.create("drop").unwrap();

        db.delete(drop.id).unwrap();
        let words = db.list().unwrap();
        assert_eq!(words, vec![keep]);
        assert_matches!(db.delete(drop.id), Err(StoreError::NotFound(_)));
    }

    #[test]
    fn test_unknown_id() {
        let mut db = create_test_db();
        let id = WordId::new();
        assert_matches!(db.toggle_seen(id), Err(StoreError::NotFound(_)));
        assert_matches!(db.set_seen(id, true), Err(StoreError::NotFound(_)));
        assert_eq!(db.get(id).unwrap(), None);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let mut db = create_test_db();
        for name in ["one", "two", "three", "four"] {
            db.create(name).unwrap();
        }
        let names: Vec<_> = db.list().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_timestamp_roundtrips_through_storage() {
        let mut db = create_test_db();
        let word = db.create("clock").unwrap();
        let stored = db.get(word.id).unwrap().unwrap();
        assert_eq!(stored.timestamp, word.timestamp);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("words.db");

        let id = {
            let mut db = WordDb::open(&path).unwrap();
            let word = db.create("persist").unwrap();
            db.toggle_seen(word.id).unwrap();
            word.id
        };

        let db = WordDb::open(&path).unwrap();
        let word = db.get(id).unwrap().unwrap();
        assert_eq!(word.name, "persist");
        assert!(word.was_seen);
    }
}
