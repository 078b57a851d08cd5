// 💾 High-Water-Mark Checkpoint
// Tiny SQLite store recording the newest timestamp processed per source.
// This is the only state that survives across runs; everything else is
// rebuilt from raw input each time.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub struct CheckpointStore {
    conn: Connection,
}

impl CheckpointStore {
    /// Open (or create) the checkpoint database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS hwm (
                source TEXT PRIMARY KEY,
                last_ts TEXT,
                run_id TEXT
            )",
            [],
        )?;
        Ok(CheckpointStore { conn })
    }

    /// Upsert the high-water mark for a source.
    pub fn set_high_water(&self, source: &str, last_ts: &str, run_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO hwm (source, last_ts, run_id) VALUES (?1, ?2, ?3)",
            params![source, last_ts, run_id],
        )?;
        Ok(())
    }

    pub fn get_high_water(&self, source: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT last_ts FROM hwm WHERE source = ?1",
                params![source],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Record the max employee start_date under the `employees` source.
    /// A dataset with no dated rows leaves the mark untouched.
    pub fn record_employee_hwm(
        &self,
        start_dates: impl IntoIterator<Item = NaiveDate>,
        run_id: &str,
    ) -> Result<Option<NaiveDate>> {
        let max = start_dates.into_iter().max();
        if let Some(max_date) = max {
            self.set_high_water("employees", &max_date.to_string(), run_id)?;
        }
        Ok(max)
    }
}
