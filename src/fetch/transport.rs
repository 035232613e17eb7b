use crate::core::{ResolveError, ResolveResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use url::Url;

/// Raw transport-level response, before any outcome classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: Url,
    pub status: u16,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

/// The seam between the fetch controller and the network. A transport only
/// moves bytes; classification of the outcome belongs to the controller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: Url,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> ResolveResult<RawResponse>;

    fn box_clone(&self) -> Box<dyn Transport>;
}

impl Clone for Box<dyn Transport> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> ResolveResult<Self> {
        let client = reqwest::ClientBuilder::new()
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(ResolveError::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: Url,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> ResolveResult<RawResponse> {
        let mut request = self.client.get(url.clone()).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse {
            url,
            status,
            body,
            timestamp: Utc::now(),
        })
    }

    fn box_clone(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}
