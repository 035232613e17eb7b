use crate::core::errors::ResolveResult;
use crate::fetch::identity::IdentityPool;
use crate::normalize::FieldAliases;
use std::time::Duration;
use url::Url;

/// What a given endpoint is expected to hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// Structured JSON from the product API.
    Api,
    /// Product page HTML.
    Markup,
}

/// One candidate endpoint, parameterized by the identifier. Templates are
/// ranked: within a fetch attempt they are tried in declaration order.
#[derive(Debug, Clone)]
pub struct EndpointTemplate {
    pub template: String,
    pub kind: PayloadKind,
}

impl EndpointTemplate {
    pub fn new(template: impl Into<String>, kind: PayloadKind) -> Self {
        Self {
            template: template.into(),
            kind,
        }
    }

    pub fn url_for(&self, id: &str) -> ResolveResult<Url> {
        Ok(Url::parse(&self.template.replace("{id}", id))?)
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Fetch attempts per retrieval, and extraction passes per resolution.
    pub max_retries: usize,
    /// Wait applied before the very first attempt of a retrieval.
    pub settle_delay: Duration,
    /// Base for the exponential backoff between retries.
    pub base_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Cooldown applied after a rate-limit signal, instead of plain backoff.
    pub rate_limit_cooldown: Duration,
    /// Upper bound of the random jitter added to every delay.
    pub jitter: Duration,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Overall budget for one resolution; elapse classifies as Cancelled.
    pub deadline: Option<Duration>,
    pub endpoints: Vec<EndpointTemplate>,
    pub identities: IdentityPool,
    pub aliases: FieldAliases,
    /// Body markers (markup payloads only) that mean the product does not exist.
    pub not_found_markers: Vec<String>,
    /// Body markers that mean the source is refusing to serve us.
    pub blocked_markers: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            settle_delay: Duration::from_secs(2),
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            rate_limit_cooldown: Duration::from_secs(5),
            jitter: Duration::from_millis(750),
            request_timeout: Duration::from_secs(12),
            deadline: None,
            endpoints: vec![
                EndpointTemplate::new(
                    "https://redsky.target.com/redsky_aggregations/v1/web/pdp_client_v1?key=9f36aeafbe60771e321a7cc95a78140772ab3e96&tcin={id}",
                    PayloadKind::Api,
                ),
                EndpointTemplate::new("https://www.target.com/p/-/A-{id}", PayloadKind::Markup),
            ],
            identities: IdentityPool::default(),
            aliases: FieldAliases::default(),
            not_found_markers: vec![
                "oops!".to_string(),
                "page not found".to_string(),
                "no longer available".to_string(),
            ],
            blocked_markers: vec![
                "access denied".to_string(),
                "captcha".to_string(),
                "verify you are a human".to_string(),
            ],
        }
    }
}

impl ResolverConfig {
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<EndpointTemplate>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_identities(mut self, identities: IdentityPool) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_aliases(mut self, aliases: FieldAliases) -> Self {
        self.aliases = aliases;
        self
    }
}
