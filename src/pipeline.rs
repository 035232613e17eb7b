use crate::core::{PayloadKind, ResolveError, ResolveResult, ResolverConfig};
use crate::extract::StrategyChain;
use crate::fetch::transport::{HttpTransport, Transport};
use crate::fetch::FetchController;
use crate::normalize::FieldAliases;
use crate::record::{CanonicalRecord, FieldSet};
use crate::stats::RunStats;
use log::{info, warn};
use tokio::time::timeout;

/// Classifier state for one resolution. `TransientFailure` is the only
/// non-terminal outcome: the pipeline loops back to another extraction pass
/// while the budget lasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Success(FieldSet),
    NotFound,
    TransientFailure(String),
    Exhausted(String),
}

impl Outcome {
    /// Absorb the result of one fetch-and-extract pass.
    pub fn classify(step: ResolveResult<FieldSet>, retries_remaining: bool) -> Self {
        match step {
            Ok(fields) => Outcome::Success(fields),
            Err(ResolveError::NotFound) => Outcome::NotFound,
            Err(err @ ResolveError::Parse(_)) if retries_remaining => {
                Outcome::TransientFailure(err.status_reason())
            }
            Err(err) => Outcome::Exhausted(err.status_reason()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending | Outcome::TransientFailure(_))
    }

    /// Each terminal state produces exactly one record.
    pub fn into_record(self, tcin: &str) -> CanonicalRecord {
        match self {
            Outcome::Success(fields) => CanonicalRecord::from_fields(tcin, fields),
            Outcome::NotFound => CanonicalRecord::invalid(tcin, "Product not found"),
            Outcome::Exhausted(reason) | Outcome::TransientFailure(reason) => {
                CanonicalRecord::invalid(tcin, reason)
            }
            Outcome::Pending => CanonicalRecord::invalid(tcin, "Resolution never completed"),
        }
    }
}

/// The resolution pipeline: fetch, extract, normalize, classify. One
/// resolver may serve many identifiers concurrently; resolutions share no
/// mutable state beyond the atomic identity cursor.
pub struct Resolver {
    controller: FetchController,
    chain: StrategyChain,
    aliases: FieldAliases,
    max_passes: usize,
    deadline: Option<std::time::Duration>,
    stats: RunStats,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> ResolveResult<Self> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(Box::new(transport), config))
    }

    pub fn with_transport(transport: Box<dyn Transport>, config: ResolverConfig) -> Self {
        Self {
            aliases: config.aliases.clone(),
            max_passes: config.max_retries.max(1),
            deadline: config.deadline,
            controller: FetchController::new(transport, config),
            chain: StrategyChain::default(),
            stats: RunStats::new(),
        }
    }

    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn stats(&self) -> RunStats {
        self.stats.clone()
    }

    /// Resolve one identifier into exactly one canonical record. Never
    /// fails past this boundary: every error is folded into the record's
    /// status, and callers must treat `Invalid:` records as data.
    pub async fn resolve(&self, tcin: &str) -> CanonicalRecord {
        let tcin = tcin.trim();
        let record = if tcin.is_empty() {
            CanonicalRecord::invalid(tcin, "Empty TCIN")
        } else {
            match self.deadline {
                Some(budget) => match timeout(budget, self.resolve_inner(tcin)).await {
                    Ok(record) => record,
                    Err(_) => {
                        warn!("resolution of {tcin} exceeded its deadline");
                        CanonicalRecord::invalid(tcin, ResolveError::Cancelled.status_reason())
                    }
                },
                None => self.resolve_inner(tcin).await,
            }
        };

        self.stats.record(&record);
        record
    }

    async fn resolve_inner(&self, tcin: &str) -> CanonicalRecord {
        let mut pass = 0;
        loop {
            pass += 1;
            info!("resolving {tcin} (pass {pass}/{})", self.max_passes);

            let step = self.run_pass(tcin).await;
            let outcome = Outcome::classify(step, pass < self.max_passes);
            if outcome.is_terminal() {
                return outcome.into_record(tcin);
            }
            warn!("no data extracted for {tcin} on pass {pass}, refetching");
        }
    }

    /// One fetch-and-extract pass: retrieve the highest-ranked payload kind,
    /// then let the chain work through it (escalating for markup as needed).
    async fn run_pass(&self, tcin: &str) -> ResolveResult<FieldSet> {
        let first_kind = self
            .controller
            .config()
            .endpoints
            .first()
            .map_or(PayloadKind::Markup, |endpoint| endpoint.kind);
        let payload = self.controller.fetch(tcin, first_kind).await?;
        self.chain
            .extract(tcin, payload, &self.controller, &self.aliases)
            .await
    }
}
