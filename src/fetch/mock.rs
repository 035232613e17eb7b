use crate::core::{ResolveError, ResolveResult};
use crate::fetch::transport::{RawResponse, Transport};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Respond(MockResponse),
    TransportError(String),
    Timeout,
}

/// Scripted transport for tests: serves outcomes in order, cycling when the
/// script runs out, and records every requested URL.
#[derive(Clone)]
pub struct MockTransport {
    script: Arc<Vec<MockOutcome>>,
    cursor: Arc<AtomicUsize>,
    requested: Arc<RwLock<Vec<Url>>>,
}

impl MockTransport {
    pub fn new(script: Vec<MockOutcome>) -> Self {
        Self {
            script: Arc::new(script),
            cursor: Arc::new(AtomicUsize::new(0)),
            requested: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Shorthand for a transport that always answers the same way.
    pub fn always(status: u16, body: impl Into<String>) -> Self {
        Self::new(vec![MockOutcome::Respond(MockResponse::new(status, body))])
    }

    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<Url> {
        self.requested.read().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        url: Url,
        _headers: &[(String, String)],
        _timeout: Duration,
    ) -> ResolveResult<RawResponse> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.requested.write().push(url.clone());

        match &self.script[index % self.script.len()] {
            MockOutcome::Respond(response) => {
                if let Some(delay) = response.delay {
                    sleep(delay).await;
                }
                Ok(RawResponse {
                    url,
                    status: response.status,
                    body: response.body.clone(),
                    timestamp: Utc::now(),
                })
            }
            MockOutcome::TransportError(message) => {
                Err(ResolveError::Transport(message.clone()))
            }
            MockOutcome::Timeout => Err(ResolveError::Timeout),
        }
    }

    fn box_clone(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}
