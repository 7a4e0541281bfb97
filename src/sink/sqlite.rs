use super::{ResultSink, SinkError};
use crate::message::Outcome;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;

// Versioned migrations, applied in order on open. The slot index is the
// schema version the migration upgrades to, tracked via PRAGMA user_version.
const MIGRATIONS: &[&str] = &["
    CREATE TABLE IF NOT EXISTS results (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        time        TEXT NOT NULL,
        duration_ms REAL,
        url         TEXT NOT NULL,
        had_error   INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_results_url_time ON results (url, time);
"];

/// SQLite-backed [`ResultSink`]: one row per probe outcome.
///
/// Opening the sink creates the database file and runs the schema migrations;
/// any error here is startup-fatal, the scheduler must never run against an
/// unmigrated store. The connection sits behind a `Mutex` because only the
/// trait object needs to be `Sync`; at runtime a single control task calls
/// `record`, so the lock is never contended.
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open result database: {}", path.display()))?;

        Self::migrate(&conn).context("Failed to migrate result database")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &Connection) -> Result<()> {
        let version: usize =
            conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))? as usize;

        for (slot, migration) in MIGRATIONS.iter().enumerate().skip(version) {
            conn.execute_batch(migration)?;
            conn.pragma_update(None, "user_version", slot as i64 + 1)?;
            tracing::debug!("applied result database migration {}", slot + 1);
        }

        Ok(())
    }
}

#[async_trait]
impl ResultSink for SqliteSink {
    async fn record(&self, outcome: &Outcome) -> Result<(), SinkError> {
        let conn = self.conn.lock().map_err(|_| SinkError::Poisoned)?;
        conn.execute(
            "INSERT INTO results (time, duration_ms, url, had_error) VALUES (?1, ?2, ?3, ?4)",
            params![
                outcome.round_started_at.to_rfc3339(),
                outcome.duration.map(|d| d.as_secs_f64() * 1000.0),
                outcome.endpoint.url,
                !outcome.succeeded,
            ],
        )?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
