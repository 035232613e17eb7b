use crate::core::config::PayloadKind;
use thiserror::Error;

/// Failure taxonomy for one resolution. Transport- and parse-level errors
/// stay inside the pipeline; `Resolver::resolve` folds every variant into
/// the returned record's status instead of surfacing it to the caller.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("product not found")]
    NotFound,

    #[error("rate limited by source")]
    RateLimited,

    #[error("access blocked by source")]
    Blocked,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("retry budget exhausted after {attempts} attempts")]
    Exhausted { attempts: usize },

    #[error("resolution cancelled")]
    Cancelled,

    #[error("no endpoint configured for {0:?} payloads")]
    NoEndpoint(PayloadKind),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ResolveError::Timeout
        } else {
            ResolveError::Transport(err.to_string())
        }
    }
}

impl ResolveError {
    /// The human-readable cause recorded after `Invalid: ` in a terminal
    /// record's status. Part of the export compatibility contract.
    pub fn status_reason(&self) -> String {
        match self {
            ResolveError::NotFound => "Product not found".to_string(),
            ResolveError::RateLimited => "Rate limited by source".to_string(),
            ResolveError::Blocked => "Access blocked by source".to_string(),
            ResolveError::Transport(msg) => format!("Transport error: {msg}"),
            ResolveError::Timeout => "Page load timeout".to_string(),
            ResolveError::Parse(_) => "Could not extract product data".to_string(),
            ResolveError::Exhausted { .. } => "Max retries exceeded".to_string(),
            ResolveError::Cancelled => "Cancelled".to_string(),
            ResolveError::NoEndpoint(kind) => {
                format!("No endpoint configured for {kind:?} payloads")
            }
            ResolveError::UrlError(err) => format!("Invalid endpoint URL: {err}"),
            ResolveError::JsonError(err) => format!("Malformed payload: {err}"),
            ResolveError::IoError(err) => format!("IO error: {err}"),
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
