//! Upload followed by verification.
//!
//! The upload call itself is opaque: anything implementing [`Uploader`]
//! (wallet-backed storage clients, pinning services) can be plugged in. Its
//! failures are returned to the caller immediately and never retried; only
//! the verification that follows is polled.

use crate::asset::PublishRequest;
use crate::error::{Error, Result};
use crate::fetch::RemoteFetcher;
use crate::verify::{PublishVerifier, VerificationMode, VerificationOutcome};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Locators returned by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishLocators {
    /// Where the metadata document is served.
    pub metadata_uri: String,
    /// Where the image is served. Absent for single-artifact uploads.
    pub image_uri: Option<String>,
}

impl PublishLocators {
    /// Create locators.
    #[must_use]
    pub fn new(metadata_uri: impl Into<String>, image_uri: Option<String>) -> Self {
        Self {
            metadata_uri: metadata_uri.into(),
            image_uri,
        }
    }
}

/// Stores an asset and its metadata on the storage network.
///
/// Implementations own whatever wallet or credentials the upload needs.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload the image and metadata payload, returning their locators.
    async fn upload(&self, asset: &Bytes, metadata: &Bytes) -> Result<PublishLocators>;
}

/// Uploads a request and confirms the result is live.
pub struct Publisher<U, F> {
    uploader: U,
    verifier: PublishVerifier<F>,
}

impl<U: Uploader, F: RemoteFetcher> Publisher<U, F> {
    /// Create a publisher.
    #[must_use]
    pub fn new(uploader: U, verifier: PublishVerifier<F>) -> Self {
        Self { uploader, verifier }
    }

    /// Access the verifier.
    #[must_use]
    pub fn verifier(&self) -> &PublishVerifier<F> {
        &self.verifier
    }

    /// Upload once, then verify.
    ///
    /// Mode is chosen from the returned locators: image bytes are checked
    /// against the request's digest whenever an image locator comes back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upload`] if the upload fails. Verification failure is
    /// not an error; it is reported as [`VerificationOutcome::Failed`].
    pub async fn publish(&self, request: &PublishRequest) -> Result<VerificationOutcome> {
        let locators = self
            .uploader
            .upload(request.asset.bytes(), &request.manifest_bytes)
            .await
            .map_err(|e| {
                error!("Upload failed: {e}");
                match e {
                    Error::Upload(_) => e,
                    other => Error::Upload(other.to_string()),
                }
            })?;

        info!(
            "Uploaded metadata={} image={}",
            locators.metadata_uri,
            locators.image_uri.as_deref().unwrap_or("-")
        );

        let mode = VerificationMode::for_locators(&locators);
        let outcome = self
            .verifier
            .verify(&locators, request.asset.digest(), mode)
            .await;

        if outcome.is_verified() {
            info!("Upload json+img done, link={}", locators.metadata_uri);
        } else {
            error!(
                "(not verified) Upload json+img FAILED, link={}",
                locators.metadata_uri
            );
        }
        Ok(outcome)
    }
}
