pub mod config;
mod errors;

pub use config::{EndpointTemplate, PayloadKind, ResolverConfig};
pub use errors::{ResolveError, ResolveResult};
