/// Data types shared between the scheduler, the round executor and the probes.
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One monitored target. The ordered endpoint set is built once from the
/// configuration at startup and is read-only for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub id: u64,
    pub url: String,
}

impl Endpoint {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }
}

/// The immutable result of one probe. A fresh value is produced for every
/// endpoint on every round; nothing is reused across rounds.
///
/// Invariant: `duration` is present exactly when `succeeded` is true. The two
/// constructors below are the only way to build an `Outcome`.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub endpoint: Endpoint,
    pub succeeded: bool,
    pub duration: Option<Duration>,
    pub round_started_at: DateTime<Utc>,
}

impl Outcome {
    /// The request/response/teardown sequence completed; `duration` is the
    /// measured wall time.
    pub fn success(endpoint: Endpoint, round_started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            endpoint,
            succeeded: true,
            duration: Some(duration),
            round_started_at,
        }
    }

    /// The check failed or was cancelled before completion. No duration is
    /// recorded for failures.
    pub fn failure(endpoint: Endpoint, round_started_at: DateTime<Utc>) -> Self {
        Self {
            endpoint,
            succeeded: false,
            duration: None,
            round_started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn success_carries_duration() {
        let started = Utc::now();
        let outcome = Outcome::success(
            Endpoint::new(0, "http://localhost"),
            started,
            Duration::from_millis(42),
        );

        assert!(outcome.succeeded);
        assert_eq!(outcome.duration, Some(Duration::from_millis(42)));
        assert_eq!(outcome.round_started_at, started);
    }

    #[test]
    fn failure_has_no_duration() {
        let outcome = Outcome::failure(Endpoint::new(3, "http://localhost"), Utc::now());

        assert!(!outcome.succeeded);
        assert_eq!(outcome.duration, None);
        assert_eq!(outcome.endpoint.id, 3);
    }
}
