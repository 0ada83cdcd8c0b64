//! Post-upload verification.
//!
//! After an upload returns its locators, the gateway is polled until the
//! published metadata and image are retrievable and correct, or the attempt
//! ceiling is reached.
//!
//! # Attempt
//!
//! ```text
//!  fetch metadata ──fail──────────────────────────────┐
//!        │                                            │
//!   validate schema + image locator                   │
//!        │                                            │
//!  fetch image bytes ──fail───────────────────────────┤
//!        │                                            │
//!  digest == expected? ──no───────────────────────────┤
//!        │                                            ▼
//!       yes (and metadata ok) ──► Verified      backoff, retry
//!                                               (ceiling ─► Failed)
//! ```
//!
//! Metadata-only runs skip the two image steps and use a longer ceiling.

mod backoff;
mod digest;
mod metadata;
mod verifier;

pub use backoff::{BackoffScheduler, BackoffStrategy, GeometricBackoff, NoWait};
pub use digest::ContentDigest;
pub use metadata::{MetadataValidator, ValidationResult};
pub use verifier::PublishVerifier;

use crate::publish::PublishLocators;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which artifacts a run confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Only the metadata document.
    MetadataOnly,
    /// Metadata document and image bytes, in the same attempt.
    MetadataAndImage,
}

impl VerificationMode {
    /// Mode implied by the locators an upload returned.
    #[must_use]
    pub fn for_locators(locators: &PublishLocators) -> Self {
        if locators.image_uri.is_some() {
            Self::MetadataAndImage
        } else {
            Self::MetadataOnly
        }
    }
}

/// Record of one poll iteration. Not kept after the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationAttempt {
    /// Zero-based attempt index.
    pub index: u32,
    /// Milliseconds slept before this attempt started.
    pub elapsed_wait_ms: u64,
    /// Metadata was fetched and passed validation.
    pub metadata_ok: bool,
    /// Image bytes matched the expected digest. Always true when the image is
    /// not checked.
    pub image_ok: bool,
}

impl VerificationAttempt {
    /// Both checks held in this attempt.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.metadata_ok && self.image_ok
    }
}

/// Terminal result of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Artifacts are live and correct.
    Verified {
        /// Locators that were confirmed.
        locators: PublishLocators,
        /// Attempts used, including the successful one.
        attempts: u32,
        /// Time spent in backoff.
        total_wait: Duration,
    },
    /// Ceiling (or deadline) reached without a successful attempt.
    Failed {
        /// Locators, kept so an operator can re-check by hand.
        locators: PublishLocators,
        /// Attempts made.
        attempts_exhausted: u32,
        /// Time spent in backoff.
        total_wait: Duration,
    },
}

impl VerificationOutcome {
    /// Returns true for [`VerificationOutcome::Verified`].
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// Locators this outcome refers to.
    #[must_use]
    pub fn locators(&self) -> &PublishLocators {
        match self {
            Self::Verified { locators, .. } | Self::Failed { locators, .. } => locators,
        }
    }

    /// Time spent in backoff.
    #[must_use]
    pub fn total_wait(&self) -> Duration {
        match self {
            Self::Verified { total_wait, .. } | Self::Failed { total_wait, .. } => *total_wait,
        }
    }
}
