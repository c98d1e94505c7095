use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use crate::error::Result;

/// Durable key-value slots holding serialized text.
///
/// A backend only stores and returns strings; parsing is the store's job.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Which durable backend the binary opens
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
pub enum BackendKind {
    #[default]
    File,
    Sqlite,
}

/// In-process storage. Clones share one map, which is how tests model two
/// tabs looking at the same storage scope.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.slot_path(key);
        // Readers only ever see a complete file: each writer has its own temp.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Slots stored as rows of a SQLite table
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the database and its `slots` table
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(SqliteBackend { conn })
    }
}

impl StorageBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO slots (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_clones_share_slots() {
        let a = MemoryBackend::new();
        let b = a.clone();
        a.set("k", "v1").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v1"));
        b.set("k", "v2").unwrap();
        assert_eq!(a.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn file_backend_missing_slot_is_none() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        assert_eq!(backend.get("nothing").unwrap(), None);
    }

    #[test]
    fn file_backend_creates_directory_and_overwrites() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let backend = FileBackend::new(&nested);
        backend.set("slot", "[1]").unwrap();
        backend.set("slot", "[2]").unwrap();
        assert_eq!(backend.get("slot").unwrap().as_deref(), Some("[2]"));
        assert!(nested.join("slot.json").exists());
        let leftovers = fs::read_dir(&nested).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn file_backend_concurrent_writers_never_tear_reads() {
        let dir = tempdir().unwrap();
        let a_text = format!("[{}]", "\"a\",".repeat(20_000).trim_end_matches(','));
        let b_text = format!("[{}]", "\"b\",".repeat(30_000).trim_end_matches(','));
        FileBackend::new(dir.path()).set("slot", &a_text).unwrap();

        let writers: Vec<_> = [a_text.clone(), b_text.clone()]
            .into_iter()
            .map(|text| {
                let backend = FileBackend::new(dir.path());
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        backend.set("slot", &text).unwrap();
                    }
                })
            })
            .collect();

        let reader = FileBackend::new(dir.path());
        for _ in 0..500 {
            let read = reader.get("slot").unwrap().unwrap();
            assert!(read == a_text || read == b_text, "torn read of {} bytes", read.len());
        }
        for w in writers {
            w.join().unwrap();
        }
        let last = reader.get("slot").unwrap().unwrap();
        assert!(last == a_text || last == b_text);
    }

    #[test]
    fn sqlite_backend_upserts() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert_eq!(backend.get("slot").unwrap(), None);
        backend.set("slot", "first").unwrap();
        backend.set("slot", "second").unwrap();
        assert_eq!(backend.get("slot").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn sqlite_backend_is_visible_across_connections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("board.db");
        let writer = SqliteBackend::open(&path).unwrap();
        let reader = SqliteBackend::open(&path).unwrap();
        writer.set("slot", "shared").unwrap();
        assert_eq!(reader.get("slot").unwrap().as_deref(), Some("shared"));
    }
}
