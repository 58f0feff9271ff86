//! Durable key-value storage backing the notes collection and the lock PIN.
//!
//! The layout is deliberately minimal: a single `app_state` table holding
//! two keys, [`NOTES_KEY`] with the JSON-serialized note array and
//! [`PIN_KEY`] with the plaintext PIN string.

use crate::Result;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// Storage key holding the JSON-serialized note array.
pub const NOTES_KEY: &str = "notes";

/// Storage key holding the plaintext PIN string.
pub const PIN_KEY: &str = "pin";

pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens (creating if necessary) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Opens a transient in-memory store. Useful for tests and previews.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )?;
        Ok(Self { conn })
    }

    /// Reads the value stored under `key`, or `None` if it was never set.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM app_state WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Writes `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO app_state (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }
}
