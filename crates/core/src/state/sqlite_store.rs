//! SQLite-backed run store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

use super::{RunRecord, RunStore, RunStoreError, StateEntry};

/// SQLite-backed run store.
pub struct SqliteRunStore {
    conn: Mutex<Connection>,
}

impl SqliteRunStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, RunStoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RunStoreError::Database(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite run store (useful for testing).
    pub fn in_memory() -> Result<Self, RunStoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RunStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                run_id TEXT PRIMARY KEY,
                run_timestamp TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT NOT NULL,
                outcome TEXT NOT NULL,
                message TEXT,
                challenger_accuracy REAL,
                champion_accuracy REAL,
                accuracy_delta REAL,
                model_fingerprint TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_runs_finished_at ON runs(finished_at DESC);

            CREATE TABLE IF NOT EXISTS pipeline_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                version INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RunStoreError> {
        self.conn.lock().map_err(|_| RunStoreError::LockPoisoned)
    }

    fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            run_id: row.get(0)?,
            run_timestamp: row.get(1)?,
            started_at: parse_timestamp(row.get::<_, String>(2)?, 2)?,
            finished_at: parse_timestamp(row.get::<_, String>(3)?, 3)?,
            outcome: row.get(4)?,
            message: row.get(5)?,
            challenger_accuracy: row.get(6)?,
            champion_accuracy: row.get(7)?,
            accuracy_delta: row.get(8)?,
            model_fingerprint: row.get(9)?,
        })
    }
}

fn parse_timestamp(text: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

const RUN_COLUMNS: &str = "run_id, run_timestamp, started_at, finished_at, outcome, message, challenger_accuracy, champion_accuracy, accuracy_delta, model_fingerprint";

impl RunStore for SqliteRunStore {
    fn record_run(&self, record: &RunRecord) -> Result<(), RunStoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO runs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                RUN_COLUMNS
            ),
            params![
                record.run_id,
                record.run_timestamp,
                record.started_at.to_rfc3339(),
                record.finished_at.to_rfc3339(),
                record.outcome,
                record.message,
                record.challenger_accuracy,
                record.champion_accuracy,
                record.accuracy_delta,
                record.model_fingerprint,
            ],
        )?;
        Ok(())
    }

    fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>, RunStoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY finished_at DESC, rowid DESC LIMIT ?",
            RUN_COLUMNS
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], Self::row_to_run)?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }

    fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>, RunStoreError> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE run_id = ?", RUN_COLUMNS),
                params![run_id],
                Self::row_to_run,
            )
            .optional()?;
        Ok(run)
    }

    fn get_state(&self, key: &str) -> Result<Option<StateEntry>, RunStoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT value, version, updated_at FROM pipeline_state WHERE key = ?",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        parse_timestamp(row.get::<_, String>(2)?, 2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(value, version, updated_at)| {
            let value: Value = serde_json::from_str(&value)
                .map_err(|e| RunStoreError::Corrupt(format!("{}: {}", key, e)))?;
            Ok(StateEntry {
                key: key.to_string(),
                value,
                version,
                updated_at,
            })
        })
        .transpose()
    }

    fn put_state(&self, key: &str, value: &Value) -> Result<StateEntry, RunStoreError> {
        let conn = self.lock()?;
        let now = Utc::now();
        let text = serde_json::to_string(value)
            .map_err(|e| RunStoreError::Corrupt(format!("{}: {}", key, e)))?;

        let version: i64 = conn.query_row(
            "INSERT INTO pipeline_state (key, value, version, updated_at) VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, version = version + 1, updated_at = ?3
             RETURNING version",
            params![key, text, now.to_rfc3339()],
            |row| row.get(0),
        )?;

        Ok(StateEntry {
            key: key.to_string(),
            value: value.clone(),
            version,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn record(run_id: &str, finished_offset_secs: i64, outcome: &str) -> RunRecord {
        let started = Utc::now();
        RunRecord {
            run_id: run_id.to_string(),
            run_timestamp: format!("ts_{}", run_id),
            started_at: started,
            finished_at: started + Duration::seconds(finished_offset_secs),
            outcome: outcome.to_string(),
            message: None,
            challenger_accuracy: Some(0.84),
            champion_accuracy: None,
            accuracy_delta: Some(0.84),
            model_fingerprint: Some("abc".to_string()),
        }
    }

    #[test]
    fn test_record_and_get_run() {
        let store = SqliteRunStore::in_memory().unwrap();
        let run = record("r1", 5, "promoted");
        store.record_run(&run).unwrap();

        let loaded = store.get_run("r1").unwrap().unwrap();
        assert_eq!(loaded.outcome, "promoted");
        assert_eq!(loaded.challenger_accuracy, Some(0.84));
        assert_eq!(loaded.champion_accuracy, None);
        assert_eq!(loaded.finished_at, run.finished_at);
        assert!(store.get_run("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_runs_newest_first() {
        let store = SqliteRunStore::in_memory().unwrap();
        store.record_run(&record("old", 1, "not_accepted")).unwrap();
        store.record_run(&record("new", 100, "promoted")).unwrap();
        store.record_run(&record("mid", 50, "error")).unwrap();

        let ids: Vec<String> = store
            .list_runs(10)
            .unwrap()
            .into_iter()
            .map(|r| r.run_id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(store.list_runs(1).unwrap().len(), 1);
    }

    #[test]
    fn test_state_versions_increase() {
        let store = SqliteRunStore::in_memory().unwrap();
        assert!(store.get_state("expected_accuracy").unwrap().is_none());

        let first = store.put_state("expected_accuracy", &json!(0.81)).unwrap();
        assert_eq!(first.version, 1);
        let second = store.put_state("expected_accuracy", &json!(0.86)).unwrap();
        assert_eq!(second.version, 2);

        let loaded = store.get_state("expected_accuracy").unwrap().unwrap();
        assert_eq!(loaded.value, json!(0.86));
        assert_eq!(loaded.version, 2);
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state").join("mlgate.db");
        {
            let store = SqliteRunStore::new(&path).unwrap();
            store.put_state("k", &json!({"a": 1})).unwrap();
        }
        let store = SqliteRunStore::new(&path).unwrap();
        assert_eq!(store.get_state("k").unwrap().unwrap().value, json!({"a": 1}));
    }
}
