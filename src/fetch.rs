//! Gateway retrieval.
//!
//! [`RemoteFetcher`] is the seam between the poll loop and the network. The
//! HTTP implementation maps every failure (connect, timeout, non-2xx, bad
//! JSON) to an [`Error`] that the verifier treats as a failed attempt.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// User agent sent with every gateway request.
pub const USER_AGENT: &str = concat!("nft-publish/", env!("CARGO_PKG_VERSION"));

/// Retrieves published artifacts by locator.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch raw bytes from `uri`.
    async fn fetch_bytes(&self, uri: &str) -> Result<Bytes>;

    /// Fetch and parse a JSON document from `uri`.
    async fn fetch_json(&self, uri: &str) -> Result<Value> {
        let body = self.fetch_bytes(uri).await?;
        serde_json::from_slice(&body).map_err(|source| Error::Json {
            uri: uri.to_string(),
            source,
        })
    }
}

/// Plain HTTP GET fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch_bytes(&self, uri: &str) -> Result<Bytes> {
        debug!("GET {uri}");
        let response = self.client.get(uri).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read body from {uri}: {e}")))?;
        debug!("GET {uri} -> {} bytes", body.len());
        Ok(body)
    }
}
