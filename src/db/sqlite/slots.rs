//! Slot table access

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension};

/// Get the raw value stored under `key`
pub fn get_slot(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM slots WHERE key = ?", [key], |row| row.get(0))
        .optional()?;

    Ok(value)
}

/// Store `value` under `key`, replacing any previous value
pub fn put_slot(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO slots (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
        rusqlite::params![key, value],
    )?;

    Ok(())
}

/// Delete the value under `key`; deleting a missing key is not an error
pub fn delete_slot(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM slots WHERE key = ?", [key])?;
    Ok(())
}

/// Delete every slot
pub fn clear_slots(conn: &Connection) -> Result<usize> {
    let rows = conn.execute("DELETE FROM slots", [])?;
    Ok(rows)
}
