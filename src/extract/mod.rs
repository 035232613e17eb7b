mod api;
mod embedded;
mod jsonld;
mod markup;

pub use api::ApiStrategy;
pub use embedded::EmbeddedStrategy;
pub use jsonld::JsonLdStrategy;
pub use markup::MarkupStrategy;

use crate::core::{PayloadKind, ResolveError, ResolveResult};
use crate::fetch::{FetchController, Payload};
use crate::normalize::FieldAliases;
use crate::record::FieldSet;
use log::{debug, info, warn};

/// One self-contained method of extracting canonical fields from a payload.
/// An attempt is acceptable only when it resolves a title; unacceptable
/// attempts return `None` and are discarded, never merged.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// The payload kind this strategy operates on.
    fn wants(&self) -> PayloadKind;

    fn attempt(&self, payload: &Payload, aliases: &FieldAliases) -> Option<FieldSet>;
}

/// Ordered sequence of extraction strategies, tried in priority order until
/// one yields an acceptable field set.
pub struct StrategyChain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(ApiStrategy),
                Box::new(JsonLdStrategy),
                Box::new(EmbeddedStrategy),
                Box::new(MarkupStrategy),
            ],
        }
    }
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// Run the chain against the initially fetched payload. When a strategy
    /// needs markup and none is in hand yet, the controller is invoked for
    /// the markup endpoint first; this escalation is deliberate, not a
    /// precondition failure.
    pub async fn extract(
        &self,
        id: &str,
        first: Payload,
        controller: &FetchController,
        aliases: &FieldAliases,
    ) -> ResolveResult<FieldSet> {
        let mut api: Option<Payload> = None;
        let mut markup: Option<Payload> = None;
        match first.kind {
            PayloadKind::Api => api = Some(first),
            PayloadKind::Markup => markup = Some(first),
        }

        for strategy in &self.strategies {
            let payload = match strategy.wants() {
                PayloadKind::Api => match api.as_ref() {
                    Some(payload) => payload,
                    None => continue,
                },
                PayloadKind::Markup => {
                    if markup.is_none() {
                        info!("escalating to markup fetch for {id}");
                        match controller.fetch(id, PayloadKind::Markup).await {
                            Ok(payload) => markup = Some(payload),
                            Err(ResolveError::NotFound) => return Err(ResolveError::NotFound),
                            Err(err) => {
                                warn!("markup escalation for {id} failed: {err}");
                                break;
                            }
                        }
                    }
                    match markup.as_ref() {
                        Some(payload) => payload,
                        None => break,
                    }
                }
            };

            debug!("trying strategy {} for {id}", strategy.name());
            if let Some(fields) = strategy.attempt(payload, aliases) {
                info!("strategy {} accepted a record for {id}", strategy.name());
                return Ok(fields);
            }
        }

        Err(ResolveError::Parse("no data extracted".to_string()))
    }
}
