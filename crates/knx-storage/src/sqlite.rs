//! SQLite-backed [`Storage`](crate::Storage) implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::{Result, Storage};

/// A key→bytes store backed by a single SQLite table, configured the way
/// `ochra-db` configures its connection (WAL mode, busy timeout).
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS kv (
                 key   TEXT PRIMARY KEY,
                 value BLOB NOT NULL
             );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl Storage for SqliteStorage {
    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let result = conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get::<_, Vec<u8>>(0)
        });
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn erase(&self, key: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut stmt = conn.prepare("SELECT key FROM kv WHERE key LIKE ?1 ORDER BY key")?;
        let like = format!("{prefix}%");
        let rows = stmt.query_map(params![like], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_erase_roundtrip() {
        let store = SqliteStorage::open_memory().expect("open");
        assert_eq!(store.read("GOT_STORE_3").expect("read"), None);

        store.write("GOT_STORE_3", b"hello").expect("write");
        assert_eq!(
            store.read("GOT_STORE_3").expect("read"),
            Some(b"hello".to_vec())
        );

        store.write("GOT_STORE_3", b"world").expect("overwrite");
        assert_eq!(
            store.read("GOT_STORE_3").expect("read"),
            Some(b"world".to_vec())
        );

        store.erase("GOT_STORE_3").expect("erase");
        assert_eq!(store.read("GOT_STORE_3").expect("read"), None);
    }

    #[test]
    fn keys_with_prefix_lists_slots_in_order() {
        let store = SqliteStorage::open_memory().expect("open");
        store.write("GOT_STORE_2", b"b").expect("write");
        store.write("GOT_STORE_10", b"c").expect("write");
        store.write("GRECT_STORE_0", b"a").expect("write");

        let keys = store.keys_with_prefix("GOT_STORE_").expect("list");
        assert_eq!(keys, vec!["GOT_STORE_10", "GOT_STORE_2"]);
    }
}
