use crate::message::{Endpoint, Outcome};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Executes a single reachability check against one endpoint.
///
/// The probe owns nothing but a shared HTTP client; every call produces a
/// fresh [`Outcome`] and touches no shared mutable state. All failure modes
/// (request construction, connect, transport, body teardown, cancellation)
/// are mapped to a failed outcome and never propagate.
#[derive(Clone)]
pub struct Probe {
    client: reqwest::Client,
    timeout: Duration,
}

impl Probe {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::ClientBuilder::new()
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Duration::from_secs(0))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, timeout }
    }

    /// Runs one GET against the endpoint, measuring wall time from just
    /// before the request is issued until the response body is fully
    /// consumed. If `cancel` fires first, the in-flight request is abandoned
    /// and the outcome is a failure with no duration.
    pub async fn check(
        &self,
        endpoint: Endpoint,
        cancel: CancellationToken,
        round_started_at: DateTime<Utc>,
    ) -> Outcome {
        let start = tokio::time::Instant::now();

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("probe of {} cancelled", endpoint.url);
                Outcome::failure(endpoint, round_started_at)
            }
            result = self.execute(&endpoint.url) => match result {
                Ok(()) => Outcome::success(endpoint, round_started_at, start.elapsed()),
                Err(e) => {
                    tracing::debug!("probe of {} failed: {}", endpoint.url, e);
                    Outcome::failure(endpoint, round_started_at)
                }
            }
        }
    }

    // The full request/response/teardown sequence. The body is drained so
    // the measured duration covers the complete exchange.
    async fn execute(&self, url: &str) -> reqwest::Result<()> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(reqwest::header::CONNECTION, "close")
            .send()
            .await?;
        response.bytes().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{Expectation, Server, matchers::request, responders::status_code};
    use pretty_assertions::assert_eq;
    use tokio::net::TcpListener;

    fn test_probe() -> Probe {
        Probe::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn check_success_measures_duration() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/"))
                .respond_with(status_code(200)),
        );

        let endpoint = Endpoint::new(0, server.url_str("/"));
        let started = Utc::now();
        let outcome = test_probe()
            .check(endpoint.clone(), CancellationToken::new(), started)
            .await;

        assert!(outcome.succeeded);
        assert!(outcome.duration.is_some());
        assert_eq!(outcome.endpoint, endpoint);
        assert_eq!(outcome.round_started_at, started);
    }

    #[tokio::test]
    async fn check_server_error_status_is_still_reachable() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/"))
                .respond_with(status_code(500)),
        );

        let outcome = test_probe()
            .check(
                Endpoint::new(0, server.url_str("/")),
                CancellationToken::new(),
                Utc::now(),
            )
            .await;

        // A completed exchange proves reachability regardless of status.
        assert!(outcome.succeeded);
        assert!(outcome.duration.is_some());
    }

    #[tokio::test]
    async fn check_connection_error_is_failure() {
        // Bind and immediately drop a listener so the port is closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let outcome = test_probe()
            .check(Endpoint::new(0, url), CancellationToken::new(), Utc::now())
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.duration, None);
    }

    #[tokio::test]
    async fn check_invalid_url_is_failure() {
        let outcome = test_probe()
            .check(
                Endpoint::new(0, "not a url"),
                CancellationToken::new(),
                Utc::now(),
            )
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.duration, None);
    }

    #[tokio::test]
    async fn check_cancelled_before_response_is_failure() {
        // A listener that accepts connections but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let holder = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                held.push(stream);
            }
        });

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let outcome = test_probe()
            .check(Endpoint::new(0, url), cancel, Utc::now())
            .await;
        holder.abort();

        assert!(!outcome.succeeded);
        assert_eq!(outcome.duration, None);
    }

    #[tokio::test]
    async fn check_already_cancelled_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = test_probe()
            .check(
                Endpoint::new(0, "http://127.0.0.1:1/"),
                cancel,
                Utc::now(),
            )
            .await;

        assert!(!outcome.succeeded);
    }
}
