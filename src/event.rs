//! Verification event system.

use crate::verify::{VerificationAttempt, VerificationMode};
use tokio::sync::broadcast;

/// Events emitted by a verification run.
#[derive(Debug, Clone)]
pub enum VerifyEvent {
    /// A run has started polling.
    Started {
        /// Metadata locator being verified.
        metadata_uri: String,
        /// Verification mode.
        mode: VerificationMode,
        /// Attempt ceiling for this run.
        ceiling: u32,
    },

    /// An attempt is about to fetch.
    AttemptStarted {
        /// Zero-based attempt index.
        index: u32,
        /// Milliseconds slept so far in this run.
        elapsed_wait_ms: u64,
    },

    /// An attempt finished without success.
    AttemptFailed {
        /// Record of the failed attempt.
        attempt: VerificationAttempt,
        /// Human-readable failure reasons.
        reasons: Vec<String>,
    },

    /// Both artifacts confirmed live.
    Verified {
        /// Metadata locator.
        metadata_uri: String,
        /// Attempts used.
        attempts: u32,
    },

    /// Ceiling or deadline reached without success.
    Failed {
        /// Metadata locator.
        metadata_uri: String,
        /// Attempts used.
        attempts: u32,
    },
}

/// Channel for receiving verification events.
pub type VerifyEventsChannel = broadcast::Receiver<VerifyEvent>;

/// Sender for verification events.
pub type VerifyEventsSender = broadcast::Sender<VerifyEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (VerifyEventsSender, VerifyEventsChannel) {
    broadcast::channel(256)
}
