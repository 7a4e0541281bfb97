use crate::executor::RoundExecutor;
use crate::message::Endpoint;
use crate::sink::ResultSink;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// The top-level control loop: probe every endpoint once per round, persist
/// the outcomes, then hold the round open until the cadence floor has passed.
///
/// The floor is measured from round start to deadline expiry, not from when
/// probing or persistence happen to finish, so endpoints are sampled at a
/// uniform interval no matter how fast or slow the network is. Shutdown is
/// observed only at round boundaries: a started round always runs to
/// completion, including its persistence step, which bounds shutdown latency
/// at one cadence period.
pub struct RoundScheduler {
    endpoints: Vec<Endpoint>,
    cadence_floor: Duration,
    executor: RoundExecutor,
    sink: Box<dyn ResultSink>,
}

impl RoundScheduler {
    pub fn new(
        endpoints: Vec<Endpoint>,
        cadence_floor: Duration,
        executor: RoundExecutor,
        sink: Box<dyn ResultSink>,
    ) -> Self {
        Self {
            endpoints,
            cadence_floor,
            executor,
            sink,
        }
    }

    /// Runs rounds until `shutdown` fires. Returns only after the in-flight
    /// round, if any, has completed and persisted its outcomes.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            "scheduler started: {} endpoints, {} cadence floor",
            self.endpoints.len(),
            humantime::format_duration(self.cadence_floor),
        );

        while !shutdown.is_cancelled() {
            self.run_round(&shutdown).await;
        }

        tracing::info!("scheduler stopped");
    }

    async fn run_round(&self, shutdown: &CancellationToken) {
        let round_started_at = chrono::Utc::now();
        let deadline = time::Instant::now() + self.cadence_floor;

        // The round token fires when the floor elapses or the parent is
        // cancelled, whichever comes first. Every probe in the round shares it.
        let round_token = shutdown.child_token();
        let timer = round_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep_until(deadline) => timer.cancel(),
                _ = timer.cancelled() => {}
            }
        });

        let outcomes = self
            .executor
            .run(&self.endpoints, round_token.clone(), round_started_at)
            .await;

        // Inserts are independent: one failure is logged and dropped, the
        // rest of the round is still attempted.
        for outcome in &outcomes {
            if let Err(e) = self.sink.record(outcome).await {
                tracing::error!(
                    "failed to record outcome for {} to {} sink: {}",
                    outcome.endpoint.url,
                    self.sink.name(),
                    e
                );
            }
        }
        tracing::debug!("round finished, {} outcomes recorded", outcomes.len());

        // Hold the round open until the deadline passes (or shutdown).
        round_token.cancelled().await;
    }
}
