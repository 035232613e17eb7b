pub mod core;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod stats;

pub use core::{EndpointTemplate, PayloadKind, ResolveError, ResolveResult, ResolverConfig};
pub use extract::{Strategy, StrategyChain};
pub use fetch::identity::{IdentityPool, IdentityProfile};
pub use fetch::transport::{HttpTransport, Transport};
pub use fetch::{FetchController, Payload};
pub use normalize::FieldAliases;
pub use pipeline::{Outcome, Resolver};
pub use record::{CanonicalRecord, ExportRow, FieldSet, RecordStatus, SENTINEL};
pub use stats::RunStats;
