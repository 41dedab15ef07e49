use crate::model::{MappingEntry, StorageError};
use crate::storage::MappingPersistence;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::debug;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database file, creating the table when needed.
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    /// Private in-memory database, mostly for tests.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS booth_mappings (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL,
                learned_at TEXT
            );
            ",
        )?;

        Ok(Self { conn })
    }

    /// Maps a `key, url, learned_at` row into a MappingEntry.
    fn map_entry(row: &Row) -> Result<MappingEntry, rusqlite::Error> {
        let learned_at_str: Option<String> = row.get(2)?;
        let learned_at = learned_at_str
            .map(|s| s.parse::<DateTime<Utc>>())
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
            })?;

        Ok(MappingEntry {
            key: row.get(0)?,
            url: row.get(1)?,
            learned_at,
        })
    }
}

impl MappingPersistence for SqliteStorage {
    fn load(&self) -> Result<Vec<MappingEntry>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, url, learned_at FROM booth_mappings ORDER BY seq ASC")?;

        let rows = stmt.query_map([], Self::map_entry)?;
        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }

        debug!("Loaded {} mappings from SQLite", entries.len());
        Ok(entries)
    }

    /// Replaces the whole table inside one transaction.
    fn save(&mut self, entries: &[MappingEntry]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM booth_mappings", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO booth_mappings (key, url, learned_at) VALUES (?1, ?2, ?3)")?;
            for entry in entries {
                stmt.execute(params![
                    &entry.key,
                    &entry.url,
                    entry.learned_at.map(|t| t.to_rfc3339()),
                ])?;
            }
        }
        tx.commit()?;

        debug!("Saved {} mappings to SQLite", entries.len());
        Ok(())
    }
}
