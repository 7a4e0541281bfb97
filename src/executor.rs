use crate::message::{Endpoint, Outcome};
use crate::probe::Probe;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Fans one probe task out per endpoint and fans the results back in.
///
/// `run` is length- and order-preserving: `outcomes[i]` always corresponds to
/// `endpoints[i]`, whatever order the probes actually finish in. Workers are
/// fully isolated from each other; a worker that fails, is cancelled, or even
/// panics still yields a failed outcome for its own endpoint and never
/// disturbs its siblings.
pub struct RoundExecutor {
    probe: Probe,
}

impl RoundExecutor {
    pub fn new(probe: Probe) -> Self {
        Self { probe }
    }

    /// Launches one worker per endpoint, all bound to the same round token,
    /// and waits for every one of them before returning. Cancelled workers
    /// produce failed outcomes rather than being dropped.
    pub async fn run(
        &self,
        endpoints: &[Endpoint],
        cancel: CancellationToken,
        round_started_at: DateTime<Utc>,
    ) -> Vec<Outcome> {
        let mut handles = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let probe = self.probe.clone();
            let endpoint = endpoint.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                probe.check(endpoint, cancel, round_started_at).await
            }));
        }

        // Joining the handles in input order doubles as the fan-in barrier.
        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, endpoint) in handles.into_iter().zip(endpoints) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::warn!("probe task for {} aborted: {}", endpoint.url, e);
                    outcomes.push(Outcome::failure(endpoint.clone(), round_started_at));
                }
            }
        }
        outcomes
    }
}
