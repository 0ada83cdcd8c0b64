//! Publish verifier: the bounded poll loop.
//!
//! A run moves `Idle -> Polling -> {Verified, Failed}`. Attempts are strictly
//! sequential; the only suspension between them is the backoff sleep, so a
//! caller can drop the future at any point without side effects.

use crate::config::VerifyConfig;
use crate::event::{VerifyEvent, VerifyEventsSender};
use crate::fetch::RemoteFetcher;
use crate::publish::PublishLocators;
use crate::verify::backoff::{BackoffScheduler, BackoffStrategy, GeometricBackoff};
use crate::verify::digest::ContentDigest;
use crate::verify::metadata::MetadataValidator;
use crate::verify::{VerificationAttempt, VerificationMode, VerificationOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Drives verification runs against a gateway.
pub struct PublishVerifier<F> {
    fetcher: F,
    validator: MetadataValidator,
    backoff: Arc<dyn BackoffStrategy>,
    full_ceiling: u32,
    metadata_only_ceiling: u32,
    overall_timeout: Option<Duration>,
    events: Option<VerifyEventsSender>,
}

impl<F: RemoteFetcher> PublishVerifier<F> {
    /// Create a verifier from configuration, with geometric backoff.
    #[must_use]
    pub fn new(fetcher: F, config: &VerifyConfig) -> Self {
        Self {
            fetcher,
            validator: MetadataValidator::new(config.image_match),
            backoff: Arc::new(GeometricBackoff::new(config.base_delay())),
            full_ceiling: config.full_ceiling,
            metadata_only_ceiling: config.metadata_only_ceiling,
            overall_timeout: config.overall_timeout(),
            events: None,
        }
    }

    /// Replace the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, strategy: impl BackoffStrategy + 'static) -> Self {
        self.backoff = Arc::new(strategy);
        self
    }

    /// Publish per-attempt events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: VerifyEventsSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Attempt ceiling for `mode`.
    #[must_use]
    pub fn ceiling(&self, mode: VerificationMode) -> u32 {
        match mode {
            VerificationMode::MetadataOnly => self.metadata_only_ceiling,
            VerificationMode::MetadataAndImage => self.full_ceiling,
        }
    }

    /// Poll until `locators` are live and correct, or the ceiling is reached.
    ///
    /// In [`VerificationMode::MetadataAndImage`] the fetched image bytes must
    /// digest to `expected`. If `locators` carries no image URI the run falls
    /// back to [`VerificationMode::MetadataOnly`].
    ///
    /// Fetch and validation failures are absorbed; only the outcome is returned.
    pub async fn verify(
        &self,
        locators: &PublishLocators,
        expected: &ContentDigest,
        mode: VerificationMode,
    ) -> VerificationOutcome {
        let mode = if mode == VerificationMode::MetadataAndImage && locators.image_uri.is_none() {
            warn!(
                "No image locator for {}; verifying metadata only",
                locators.metadata_uri
            );
            VerificationMode::MetadataOnly
        } else {
            mode
        };

        let span = info_span!("verify", metadata_uri = %locators.metadata_uri, ?mode);
        self.run(locators, Some(expected), mode)
            .instrument(span)
            .await
    }

    /// Poll until the metadata document at `locators.metadata_uri` is valid.
    ///
    /// If `locators` carries an image URI, the document's `image` must match it,
    /// but the image bytes are not fetched.
    pub async fn verify_metadata(&self, locators: &PublishLocators) -> VerificationOutcome {
        let mode = VerificationMode::MetadataOnly;
        let span = info_span!("verify", metadata_uri = %locators.metadata_uri, ?mode);
        self.run(locators, None, mode).instrument(span).await
    }

    async fn run(
        &self,
        locators: &PublishLocators,
        expected: Option<&ContentDigest>,
        mode: VerificationMode,
    ) -> VerificationOutcome {
        let ceiling = self.ceiling(mode);
        let mut backoff = BackoffScheduler::new(self.backoff.as_ref(), ceiling);
        let deadline = self.overall_timeout.map(|t| Instant::now() + t);
        let image = match mode {
            VerificationMode::MetadataAndImage => locators.image_uri.as_deref().zip(expected),
            VerificationMode::MetadataOnly => None,
        };

        self.emit(VerifyEvent::Started {
            metadata_uri: locators.metadata_uri.clone(),
            mode,
            ceiling,
        });

        let mut attempts = 0;
        for index in 0..ceiling {
            let elapsed_wait_ms =
                u64::try_from(backoff.total_wait().as_millis()).unwrap_or(u64::MAX);
            info!(
                attempt = index,
                link = %locators.metadata_uri,
                waiting_ms = elapsed_wait_ms,
                "Verifying published artifacts"
            );
            self.emit(VerifyEvent::AttemptStarted {
                index,
                elapsed_wait_ms,
            });

            let mut attempt = VerificationAttempt {
                index,
                elapsed_wait_ms,
                metadata_ok: false,
                image_ok: image.is_none(),
            };
            let reasons = self.attempt(locators, image, &mut attempt).await;
            attempts = index + 1;

            if attempt.succeeded() {
                info!(
                    "Verified {} after {} attempt(s)",
                    locators.metadata_uri, attempts
                );
                self.emit(VerifyEvent::Verified {
                    metadata_uri: locators.metadata_uri.clone(),
                    attempts,
                });
                return VerificationOutcome::Verified {
                    locators: locators.clone(),
                    attempts,
                    total_wait: backoff.total_wait(),
                };
            }

            self.emit(VerifyEvent::AttemptFailed { attempt, reasons });

            let Some(delay) = backoff.peek() else {
                break;
            };
            if deadline.is_some_and(|deadline| Instant::now() + delay > deadline) {
                warn!(
                    "Next backoff of {}ms would exceed the run deadline; giving up",
                    delay.as_millis()
                );
                break;
            }
            backoff.next();
            tokio::time::sleep(delay).await;
        }

        error!(
            "Not verified after {} attempt(s): metadata={} image={}",
            attempts,
            locators.metadata_uri,
            locators.image_uri.as_deref().unwrap_or("-")
        );
        self.emit(VerifyEvent::Failed {
            metadata_uri: locators.metadata_uri.clone(),
            attempts,
        });
        VerificationOutcome::Failed {
            locators: locators.clone(),
            attempts_exhausted: attempts,
            total_wait: backoff.total_wait(),
        }
    }

    /// One fetch-and-check pass. Fills in `attempt` and returns failure reasons.
    async fn attempt(
        &self,
        locators: &PublishLocators,
        image: Option<(&str, &ContentDigest)>,
        attempt: &mut VerificationAttempt,
    ) -> Vec<String> {
        let doc = match self.fetcher.fetch_json(&locators.metadata_uri).await {
            Ok(doc) => doc,
            Err(e) => {
                debug!("Metadata fetch error: {e}");
                error!(
                    "Invalid metadata at {}, just wait...",
                    locators.metadata_uri
                );
                return vec![e.to_string()];
            }
        };

        let validation = self
            .validator
            .validate(&doc, locators.image_uri.as_deref());
        attempt.metadata_ok = validation.ok();
        if attempt.metadata_ok {
            info!("Metadata file ok: {}", locators.metadata_uri);
        } else {
            error!(
                expected_image = locators.image_uri.as_deref().unwrap_or("-"),
                actual_image = %doc.get("image").unwrap_or(&serde_json::Value::Null),
                reasons = ?validation.reasons,
                "Invalid metadata file"
            );
        }
        let mut reasons = validation.reasons;

        if let Some((image_uri, expected)) = image {
            match self.fetcher.fetch_bytes(image_uri).await {
                Ok(bytes) => {
                    let actual = ContentDigest::of(&bytes);
                    attempt.image_ok = &actual == expected;
                    if attempt.image_ok {
                        info!("Image file ok: {image_uri}");
                    } else {
                        error!(
                            expected = %expected,
                            actual = %actual,
                            len = bytes.len(),
                            "Invalid image file at {image_uri}"
                        );
                        reasons.push(format!(
                            "image digest {actual} does not match expected {expected}"
                        ));
                    }
                }
                Err(e) => {
                    error!("Image not available at {image_uri}: {e}");
                    reasons.push(e.to_string());
                }
            }

            match (attempt.metadata_ok, attempt.image_ok) {
                (true, false) => warn!("Metadata is live but image is not yet correct"),
                (false, true) => warn!("Image is live but metadata is not yet correct"),
                _ => {}
            }
        }

        reasons
    }

    fn emit(&self, event: VerifyEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
