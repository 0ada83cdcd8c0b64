//! Mock gateway and uploader used by the E2E tests.

use async_trait::async_trait;
use bytes::Bytes;
use nft_publish::{ContentDigest, Error, PublishLocators, Result, Uploader};
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mocked content-addressed storage gateway.
#[derive(Clone)]
pub struct TestGateway {
    server: Arc<MockServer>,
}

impl TestGateway {
    /// Start an empty gateway.
    pub async fn start() -> Self {
        Self {
            server: Arc::new(MockServer::start().await),
        }
    }

    /// Base URI of the gateway.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Serve `body` at `route` after answering `not_found` requests with 404.
    pub async fn serve(&self, route: &str, body: Bytes, not_found: u64) {
        if not_found > 0 {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(404))
                .up_to_n_times(not_found)
                .with_priority(1)
                .mount(&self.server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Serve a JSON document at `route`.
    pub async fn serve_json(&self, route: &str, doc: &Value, not_found: u64) {
        self.serve(route, Bytes::from(doc.to_string()), not_found)
            .await;
    }

    /// Total requests received on any route.
    pub async fn total_hits(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Number of GET requests received for `route`.
    pub async fn hits(&self, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == route)
            .count()
    }
}

/// Uploader that publishes straight onto a [`TestGateway`].
///
/// The image is served under its digest; the manifest is served with its
/// `image` field rewritten to the image locator, the way storage uploaders
/// patch manifests before storing them.
pub struct GatewayUploader {
    gateway: TestGateway,
    not_found: u64,
    corrupt_image: bool,
    fail: bool,
    calls: Arc<AtomicU32>,
}

impl GatewayUploader {
    /// Uploader whose artifacts are live immediately.
    pub fn new(gateway: TestGateway) -> Self {
        Self {
            gateway,
            not_found: 0,
            corrupt_image: false,
            fail: false,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Artifacts 404 this many times before appearing.
    pub fn with_propagation_delay(mut self, not_found: u64) -> Self {
        self.not_found = not_found;
        self
    }

    /// Serve different bytes than were uploaded.
    pub fn with_corrupt_image(mut self) -> Self {
        self.corrupt_image = true;
        self
    }

    /// Reject every upload.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Shared upload counter.
    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Uploader for GatewayUploader {
    async fn upload(&self, asset: &Bytes, metadata: &Bytes) -> Result<PublishLocators> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Upload("insufficient storage balance".to_string()));
        }

        let digest = ContentDigest::of(asset);
        let image_route = format!("/{digest}");
        let meta_route = format!("/{digest}.json");
        let image_uri = format!("{}{image_route}", self.gateway.uri());
        let metadata_uri = format!("{}{meta_route}", self.gateway.uri());

        let mut doc: Value = serde_json::from_slice(metadata)
            .map_err(|e| Error::Upload(format!("manifest rejected: {e}")))?;
        doc["image"] = Value::String(image_uri.clone());
        if let Some(files) = doc
            .get_mut("properties")
            .and_then(|p| p.get_mut("files"))
            .and_then(Value::as_array_mut)
        {
            for file in files {
                file["uri"] = Value::String(image_uri.clone());
            }
        }

        let served = if self.corrupt_image {
            let mut bytes = asset.to_vec();
            bytes.truncate(bytes.len() / 2);
            Bytes::from(bytes)
        } else {
            asset.clone()
        };

        self.gateway
            .serve(&image_route, served, self.not_found)
            .await;
        self.gateway
            .serve_json(&meta_route, &doc, self.not_found)
            .await;

        Ok(PublishLocators::new(metadata_uri, Some(image_uri)))
    }
}
