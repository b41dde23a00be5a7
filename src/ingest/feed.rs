//! Feed retrieval.
//!
//! [`FeedSource`] is the only thing ingestion knows about where the XML comes
//! from. The HTTP client performs exactly one bounded GET per run.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::error::FetchError;
use crate::config::FeedConfig;

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns the raw feed document.
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;

    /// Human-readable origin used in logs.
    fn describe(&self) -> String;
}

/// Fetches the feed over HTTP(S) with a whole-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    client: reqwest::Client,
    url: Url,
}

impl HttpFeedClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("event-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, url })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self, FetchError> {
        Self::new(&config.url, config.timeout())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let url = self.url.to_string();

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Body { url, source })?;

        tracing::debug!(bytes = body.len(), "Fetched feed document");
        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// In-memory feed, used by tests and for replaying a saved document.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    body: Vec<u8>,
}

impl StaticFeed {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        Ok(self.body.clone())
    }

    fn describe(&self) -> String {
        format!("static feed ({} bytes)", self.body.len())
    }
}
