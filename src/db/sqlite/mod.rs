//! SQLite database module

mod migrations;
mod slots;

use crate::db::{Slot, StateStore};
use crate::error::Result;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Open (or create) the state database at `path`
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;

        tracing::info!("State database opened at {}", path.display());
        Ok(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }
}

impl StateStore for SqliteDb {
    fn get(&self, slot: Slot) -> Result<Option<String>> {
        let conn = self.conn.lock();
        slots::get_slot(&conn, slot.key())
    }

    fn put(&self, slot: Slot, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        slots::put_slot(&conn, slot.key(), value)
    }

    fn remove(&self, slot: Slot) -> Result<()> {
        let conn = self.conn.lock();
        slots::delete_slot(&conn, slot.key())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn.lock();
        let removed = slots::clear_slots(&conn)?;
        tracing::debug!("Cleared {} state slots", removed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.db");

        {
            let db = SqliteDb::new(&path).unwrap();
            db.put(Slot::SelectedStock, r#"{"symbol":"2330.TW"}"#).unwrap();
            db.put(Slot::OptimizedParams, r#"{"short":7}"#).unwrap();
            db.remove(Slot::OptimizedParams).unwrap();
        }

        let db = SqliteDb::new(&path).unwrap();
        assert_eq!(
            db.get(Slot::SelectedStock).unwrap().as_deref(),
            Some(r#"{"symbol":"2330.TW"}"#)
        );
        assert_eq!(db.get(Slot::OptimizedParams).unwrap(), None);
    }

    #[test]
    fn test_clear_removes_everything() {
        let db = SqliteDb::open_in_memory().unwrap();
        for slot in Slot::ALL {
            db.put(slot, "{}").unwrap();
        }
        db.clear().unwrap();
        for slot in Slot::ALL {
            assert_eq!(db.get(slot).unwrap(), None);
        }
    }
}
