pub mod identity;
pub mod mock;
pub mod transport;

use crate::core::{PayloadKind, ResolveError, ResolveResult, ResolverConfig};
use crate::fetch::transport::{RawResponse, Transport};
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Usable retrieved content, ready for the strategy chain.
#[derive(Debug, Clone)]
pub struct Payload {
    pub kind: PayloadKind,
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// Issues outbound requests against the ranked endpoint templates, enforces
/// settle delay, exponential backoff and rate-limit cooldown, and classifies
/// transport outcomes. One controller is shared by all strategies of a
/// resolution; it holds no per-identifier state.
pub struct FetchController {
    transport: Box<dyn Transport>,
    config: ResolverConfig,
    rng: Mutex<StdRng>,
}

impl FetchController {
    pub fn new(transport: Box<dyn Transport>, config: ResolverConfig) -> Self {
        Self {
            transport,
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic jitter for tests.
    pub fn with_seed(transport: Box<dyn Transport>, config: ResolverConfig, seed: u64) -> Self {
        Self {
            transport,
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Retrieve a payload of the wanted kind for `id`, retrying up to the
    /// configured budget. A definitive not-found short-circuits every
    /// remaining endpoint and retry.
    pub async fn fetch(&self, id: &str, wanted: PayloadKind) -> ResolveResult<Payload> {
        let ranked: Vec<_> = self
            .config
            .endpoints
            .iter()
            .filter(|endpoint| endpoint.kind == wanted)
            .collect();
        if ranked.is_empty() {
            return Err(ResolveError::NoEndpoint(wanted));
        }

        let mut delay = self.config.settle_delay;
        let mut last_err: Option<ResolveError> = None;

        for attempt in 0..self.config.max_retries {
            if !delay.is_zero() {
                trace!("waiting {delay:?} before attempt {} for {id}", attempt + 1);
                sleep(delay).await;
            }

            match self.run_attempt(id, &ranked, attempt).await {
                Ok(payload) => {
                    info!(
                        "fetched {:?} payload for {id} from {} (attempt {}, status {})",
                        payload.kind,
                        payload.url,
                        attempt + 1,
                        payload.status
                    );
                    return Ok(payload);
                }
                Err(ResolveError::NotFound) => {
                    info!("{id} does not exist at the source, not retrying");
                    return Err(ResolveError::NotFound);
                }
                Err(ResolveError::RateLimited) => {
                    warn!(
                        "rate limited while fetching {id} (attempt {}), cooling down",
                        attempt + 1
                    );
                    delay = self.config.rate_limit_cooldown + self.jitter();
                    last_err = Some(ResolveError::RateLimited);
                }
                Err(err) => {
                    warn!("attempt {} for {id} failed: {err}", attempt + 1);
                    delay = self.backoff_delay(attempt + 1) + self.jitter();
                    last_err = Some(err);
                }
            }
        }

        Err(match last_err {
            Some(ResolveError::Blocked) => ResolveError::Blocked,
            _ => ResolveError::Exhausted {
                attempts: self.config.max_retries,
            },
        })
    }

    /// Backoff before retry `attempt`, jitter excluded: `base * 2^attempt`
    /// clamped to the configured ceiling. Strictly increasing until the
    /// ceiling is reached.
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let delay = self.config.base_delay.mul_f64(2f64.powi(attempt as i32));
        std::cmp::min(delay, self.config.max_delay)
    }

    fn jitter(&self) -> Duration {
        let window = self.config.jitter.as_millis() as u64;
        if window == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.lock().random_range(0..=window))
    }

    /// One pass over the ranked endpoints. The first endpoint yielding a
    /// usable payload wins; a terminal or cooldown-worthy classification
    /// stops the pass immediately.
    async fn run_attempt(
        &self,
        id: &str,
        ranked: &[&crate::core::EndpointTemplate],
        attempt: usize,
    ) -> ResolveResult<Payload> {
        let mut last_err: Option<ResolveError> = None;

        for endpoint in ranked {
            let url = endpoint.url_for(id)?;
            debug!("requesting {url} (attempt {})", attempt + 1);

            match self.try_endpoint(url, endpoint.kind).await {
                Ok(payload) => return Ok(payload),
                Err(
                    err @ (ResolveError::NotFound
                    | ResolveError::RateLimited
                    | ResolveError::Blocked),
                ) => return Err(err),
                Err(err) => {
                    debug!("endpoint failed: {err}, trying next");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(ResolveError::NoEndpoint(ranked[0].kind)))
    }

    async fn try_endpoint(&self, url: Url, kind: PayloadKind) -> ResolveResult<Payload> {
        let profile = self.config.identities.next();
        let raw = self
            .transport
            .get(url, &profile.header_pairs(), self.config.request_timeout)
            .await?;
        self.classify(raw, kind)
    }

    /// Map a raw transport outcome onto the failure taxonomy, or accept it
    /// as a payload.
    fn classify(&self, raw: RawResponse, kind: PayloadKind) -> ResolveResult<Payload> {
        match raw.status {
            404 | 410 => Err(ResolveError::NotFound),
            429 => Err(ResolveError::RateLimited),
            401 | 403 => Err(ResolveError::Blocked),
            status if status >= 500 => {
                Err(ResolveError::Transport(format!("server error {status}")))
            }
            status if status >= 400 => {
                Err(ResolveError::Transport(format!("unexpected status {status}")))
            }
            status => {
                if raw.body.trim().is_empty() {
                    return Err(ResolveError::Transport("empty response body".to_string()));
                }
                // Soft signals only appear in markup; the API reports them
                // through status codes.
                if kind == PayloadKind::Markup {
                    let lowered = raw.body.to_lowercase();
                    if self
                        .config
                        .not_found_markers
                        .iter()
                        .any(|marker| lowered.contains(marker))
                    {
                        return Err(ResolveError::NotFound);
                    }
                    if self
                        .config
                        .blocked_markers
                        .iter()
                        .any(|marker| lowered.contains(marker))
                    {
                        return Err(ResolveError::Blocked);
                    }
                }
                Ok(Payload {
                    kind,
                    url: raw.url,
                    status,
                    body: raw.body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EndpointTemplate;
    use crate::fetch::mock::{MockOutcome, MockResponse, MockTransport};

    fn fast_config() -> ResolverConfig {
        ResolverConfig::default()
            .with_settle_delay(Duration::ZERO)
            .with_base_delay(Duration::from_millis(1))
            .with_rate_limit_cooldown(Duration::from_millis(5))
            .with_jitter(Duration::ZERO)
            .with_endpoints(vec![EndpointTemplate::new(
                "https://page.test/p/-/A-{id}",
                PayloadKind::Markup,
            )])
    }

    fn controller(transport: MockTransport, config: ResolverConfig) -> FetchController {
        FetchController::with_seed(Box::new(transport), config, 7)
    }

    #[tokio::test]
    async fn not_found_short_circuits_after_one_attempt() {
        let transport = MockTransport::always(404, "gone");
        let ctrl = controller(transport.clone(), fast_config());

        let err = ctrl.fetch("123", PayloadKind::Markup).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn not_found_page_markers_are_definitive() {
        let transport = MockTransport::always(200, "<h1>Oops! Page not found</h1>");
        let ctrl = controller(transport.clone(), fast_config());

        let err = ctrl.fetch("123", PayloadKind::Markup).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn transport_errors_are_retried_within_budget() {
        let transport = MockTransport::new(vec![
            MockOutcome::TransportError("connection reset".to_string()),
            MockOutcome::TransportError("connection reset".to_string()),
            MockOutcome::Respond(MockResponse::new(200, "<html>third time</html>")),
        ]);
        let ctrl = controller(transport.clone(), fast_config());

        let payload = ctrl.fetch("123", PayloadKind::Markup).await.unwrap();
        assert_eq!(payload.body, "<html>third time</html>");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_is_terminal() {
        let transport = MockTransport::new(vec![MockOutcome::Timeout]);
        let ctrl = controller(transport.clone(), fast_config());

        let err = ctrl.fetch("123", PayloadKind::Markup).await.unwrap_err();
        assert!(matches!(err, ResolveError::Exhausted { attempts: 3 }));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn rate_limit_counts_as_retry_and_recovers() {
        let transport = MockTransport::new(vec![
            MockOutcome::Respond(MockResponse::new(429, "slow down")),
            MockOutcome::Respond(MockResponse::new(200, "<html>ok</html>")),
        ]);
        let ctrl = controller(transport.clone(), fast_config());

        let payload = ctrl.fetch("123", PayloadKind::Markup).await.unwrap();
        assert_eq!(payload.status, 200);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn persistent_blocking_is_reported_as_blocked() {
        let transport = MockTransport::always(403, "forbidden");
        let ctrl = controller(transport.clone(), fast_config());

        let err = ctrl.fetch("123", PayloadKind::Markup).await.unwrap_err();
        assert!(matches!(err, ResolveError::Blocked));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn ranked_endpoints_fall_through_within_one_attempt() {
        let config = fast_config().with_endpoints(vec![
            EndpointTemplate::new("https://one.test/{id}", PayloadKind::Markup),
            EndpointTemplate::new("https://two.test/{id}", PayloadKind::Markup),
        ]);
        let transport = MockTransport::new(vec![
            MockOutcome::Respond(MockResponse::new(500, "boom")),
            MockOutcome::Respond(MockResponse::new(200, "<html>second</html>")),
        ]);
        let ctrl = controller(transport.clone(), config);

        let payload = ctrl.fetch("123", PayloadKind::Markup).await.unwrap();
        assert_eq!(payload.url.host_str(), Some("two.test"));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn unmatched_kind_is_rejected() {
        let transport = MockTransport::always(200, "{}");
        let ctrl = controller(transport, fast_config());

        let err = ctrl.fetch("123", PayloadKind::Api).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoEndpoint(PayloadKind::Api)));
    }

    #[test]
    fn backoff_grows_strictly_until_the_ceiling() {
        let transport = MockTransport::always(200, "ok");
        let ctrl = controller(transport, fast_config().with_base_delay(Duration::from_secs(2)));

        let mut previous = Duration::ZERO;
        for attempt in 1..=3 {
            let delay = ctrl.backoff_delay(attempt);
            assert!(delay > previous, "backoff must grow: {delay:?} vs {previous:?}");
            previous = delay;
        }
        assert_eq!(ctrl.backoff_delay(1), Duration::from_secs(4));
        assert_eq!(ctrl.backoff_delay(2), Duration::from_secs(8));
    }

    #[test]
    fn rate_limit_cooldown_exceeds_first_backoff() {
        let config = ResolverConfig::default();
        assert!(config.rate_limit_cooldown > config.base_delay);
    }
}
