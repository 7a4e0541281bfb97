mod sqlite;

use crate::message::Outcome;
use async_trait::async_trait;
use thiserror::Error;

pub use sqlite::SqliteSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("sink lock poisoned")]
    Poisoned,
}

/// Durable append-only store for probe outcomes.
///
/// The scheduler calls `record` once per outcome, sequentially, within the
/// round. A returned error is logged and discarded by the caller; it is never
/// retried and never aborts the round.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn record(&self, outcome: &Outcome) -> Result<(), SinkError>;

    /// Returns the name of this sink for logging purposes.
    fn name(&self) -> &'static str;
}
