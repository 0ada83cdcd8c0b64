//! # nft-publish
//!
//! Publishes an NFT's off-chain assets (image + metadata JSON) to a
//! content-addressed storage network and confirms, by polling the gateway,
//! that both artifacts are retrievable and correct before a mint proceeds.
//!
//! ## Flow
//!
//! ```text
//! image + manifest ──► Uploader ──► PublishLocators
//!                                        │
//!                                        ▼
//!                                 PublishVerifier ◄── BackoffScheduler
//!                                  │          │
//!                          RemoteFetcher   MetadataValidator / ContentDigest
//!                                        │
//!                                        ▼
//!                          VerificationOutcome::{Verified, Failed}
//! ```
//!
//! Storage gateways are eventually consistent: a freshly uploaded object may
//! 404 or serve stale bytes for minutes. The verifier turns that into a single
//! "confirmed live" answer the caller can act on.

pub mod asset;
pub mod config;
pub mod error;
pub mod event;
pub mod fetch;
pub mod publish;
pub mod verify;

pub use asset::{AssetBundle, PublishRequest};
pub use config::{ImageMatchRule, PublishConfig, VerifyConfig};
pub use error::{Error, Result};
pub use event::{create_event_channel, VerifyEvent, VerifyEventsChannel, VerifyEventsSender};
pub use fetch::{HttpFetcher, RemoteFetcher};
pub use publish::{PublishLocators, Publisher, Uploader};
pub use verify::{
    BackoffScheduler, BackoffStrategy, ContentDigest, GeometricBackoff, MetadataValidator,
    NoWait, PublishVerifier, ValidationResult, VerificationAttempt, VerificationMode,
    VerificationOutcome,
};
