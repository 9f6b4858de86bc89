//! SQLite-backed state store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{StateStore, StoreError};

const HANDLED_TABLE: &str = "handled_posts";
const REACTED_TABLE: &str = "reactions";

/// State store persisted in `state.db` under the data directory.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    max_markers: usize,
}

impl SqliteStore {
    /// Open or create the database and its schema.
    ///
    /// Failure here is meant to stop the process before the first tick.
    pub fn open(data_dir: &Path, max_markers: usize) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            StoreError::Unavailable(format!(
                "creating data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;
        let db_path = data_dir.join("state.db");
        let conn = Connection::open(&db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self::with_connection(conn, max_markers)?;
        info!(path = %db_path.display(), max_markers, "State store initialized");
        Ok(store)
    }

    /// Fresh store that lives only as long as the value.
    pub fn open_in_memory(max_markers: usize) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, max_markers)
    }

    fn with_connection(conn: Connection, max_markers: usize) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_markers,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn mark(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let next_seq: i64 = tx.query_row(
            &format!("SELECT COALESCE(MAX(seq), 0) + 1 FROM {}", table),
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            &format!(
                "INSERT INTO {} (post_id, seq, marked_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(post_id) DO UPDATE SET seq = ?2, marked_at = ?3",
                table
            ),
            params![id, next_seq, unix_now()],
        )?;
        let pruned = tx.execute(
            &format!(
                "DELETE FROM {table} WHERE post_id NOT IN (
                    SELECT post_id FROM {table} ORDER BY seq DESC LIMIT ?1
                 )",
                table = table
            ),
            params![self.max_markers as i64],
        )?;

        tx.commit()?;
        debug!(table, id, pruned, "Marked");
        Ok(())
    }

    fn contains(&self, table: &str, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE post_id = ?1", table),
                [id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl StateStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM bot_state WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO bot_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, unix_now()],
        )?;
        Ok(())
    }

    fn mark_handled(&self, id: &str) -> Result<(), StoreError> {
        self.mark(HANDLED_TABLE, id)
    }

    fn is_handled(&self, id: &str) -> Result<bool, StoreError> {
        self.contains(HANDLED_TABLE, id)
    }

    fn mark_reacted(&self, id: &str) -> Result<(), StoreError> {
        self.mark(REACTED_TABLE, id)
    }

    fn is_reacted(&self, id: &str) -> Result<bool, StoreError> {
        self.contains(REACTED_TABLE, id)
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS bot_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at REAL NOT NULL
        );
        CREATE TABLE IF NOT EXISTS handled_posts (
            post_id TEXT PRIMARY KEY,
            seq INTEGER NOT NULL,
            marked_at REAL NOT NULL
        );
        CREATE TABLE IF NOT EXISTS reactions (
            post_id TEXT PRIMARY KEY,
            seq INTEGER NOT NULL,
            marked_at REAL NOT NULL
        );",
    )?;
    Ok(())
}

fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_set_roundtrip() {
        let store = SqliteStore::open_in_memory(10).unwrap();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("daily_count", "3").unwrap();
        store.set("daily_count", "4").unwrap();
        assert_eq!(store.get("daily_count").unwrap().as_deref(), Some("4"));
    }

    #[test]
    fn test_handled_set_keeps_most_recent() {
        let store = SqliteStore::open_in_memory(3).unwrap();
        for id in ["p1", "p2", "p3", "p4"] {
            store.mark_handled(id).unwrap();
        }

        assert!(!store.is_handled("p1").unwrap());
        for id in ["p2", "p3", "p4"] {
            assert!(store.is_handled(id).unwrap());
        }

        // Re-marking refreshes recency
        store.mark_handled("p2").unwrap();
        store.mark_handled("p5").unwrap();
        assert!(store.is_handled("p2").unwrap());
        assert!(!store.is_handled("p3").unwrap());
    }

    #[test]
    fn test_reacted_set_is_separate() {
        let store = SqliteStore::open_in_memory(5).unwrap();
        store.mark_reacted("p1").unwrap();

        assert!(store.is_reacted("p1").unwrap());
        assert!(!store.is_handled("p1").unwrap());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteStore::open(dir.path(), 10).unwrap();
            store.mark_handled("post-42").unwrap();
            store.set("last_post_time", "1700000000.5").unwrap();
        }

        let store = SqliteStore::open(dir.path(), 10).unwrap();
        assert!(store.is_handled("post-42").unwrap());
        assert_eq!(
            store.get("last_post_time").unwrap().as_deref(),
            Some("1700000000.5")
        );
    }
}
