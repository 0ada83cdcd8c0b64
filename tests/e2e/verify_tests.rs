//! Verifying already-uploaded artifacts over HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::TestGateway;
use bytes::Bytes;
use nft_publish::{
    create_event_channel, ContentDigest, HttpFetcher, ImageMatchRule, PublishLocators,
    PublishVerifier, VerificationMode, VerificationOutcome, VerifyConfig, VerifyEvent,
};
use serde_json::json;
use std::time::Duration;

fn verifier(config: &VerifyConfig) -> PublishVerifier<HttpFetcher> {
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).expect("client");
    PublishVerifier::new(fetcher, config)
}

fn fast_config() -> VerifyConfig {
    VerifyConfig {
        base_delay_ms: 1,
        ..VerifyConfig::default()
    }
}

#[tokio::test]
async fn test_first_attempt_success() {
    let gateway = TestGateway::start().await;
    let image_uri = format!("{}/abc", gateway.uri());
    let doc = json!({
        "name": "X",
        "image": image_uri,
        "seller_fee_basis_points": 500,
        "properties": { "creators": [] }
    });
    gateway.serve_json("/meta", &doc, 0).await;
    gateway
        .serve("/abc", Bytes::from_static(b"image-bytes"), 0)
        .await;

    let locators = PublishLocators::new(format!("{}/meta", gateway.uri()), Some(image_uri));
    let outcome = verifier(&fast_config())
        .verify(
            &locators,
            &ContentDigest::of(b"image-bytes"),
            VerificationMode::MetadataAndImage,
        )
        .await;

    assert_eq!(
        outcome,
        VerificationOutcome::Verified {
            locators,
            attempts: 1,
            total_wait: Duration::ZERO,
        }
    );
}

#[tokio::test]
async fn test_metadata_only_never_fetches_image() {
    let gateway = TestGateway::start().await;
    let image_uri = format!("{}/abc", gateway.uri());
    let doc = json!({
        "name": "X",
        "image": image_uri,
        "seller_fee_basis_points": 500,
        "properties": { "creators": [] }
    });
    gateway.serve_json("/meta", &doc, 9).await;
    gateway.serve("/abc", Bytes::from_static(b"img"), 0).await;

    let locators = PublishLocators::new(format!("{}/meta", gateway.uri()), Some(image_uri));
    let outcome = verifier(&fast_config()).verify_metadata(&locators).await;

    assert!(matches!(
        outcome,
        VerificationOutcome::Verified { attempts: 10, .. }
    ));
    assert_eq!(gateway.hits("/meta").await, 10);
    assert_eq!(gateway.hits("/abc").await, 0);
}

#[tokio::test]
async fn test_server_errors_exhaust_ceiling() {
    let gateway = TestGateway::start().await;
    let config = VerifyConfig {
        metadata_only_ceiling: 3,
        ..fast_config()
    };
    let (tx, mut rx) = create_event_channel();
    let verifier = verifier(&config).with_events(tx);

    let locators = PublishLocators::new(format!("{}/gone", gateway.uri()), None);
    let outcome = verifier.verify_metadata(&locators).await;

    assert_eq!(
        outcome,
        VerificationOutcome::Failed {
            locators,
            attempts_exhausted: 3,
            total_wait: Duration::from_millis(7),
        }
    );

    let mut failed_attempts = 0;
    while let Ok(event) = rx.try_recv() {
        if let VerifyEvent::AttemptFailed { reasons, .. } = event {
            assert!(reasons[0].contains("404"));
            failed_attempts += 1;
        }
    }
    assert_eq!(failed_attempts, 3);
}

#[tokio::test]
async fn test_gateway_prefix_skew() {
    let gateway = TestGateway::start().await;
    let doc = json!({
        "name": "X",
        "image": "https://www.arweave.net/Q2x1c3Rlcg?ext=png",
        "seller_fee_basis_points": "500",
        "properties": { "creators": [] }
    });
    gateway.serve_json("/meta", &doc, 0).await;
    let locators = PublishLocators::new(
        format!("{}/meta", gateway.uri()),
        Some("https://arweave.net/Q2x1c3Rlcg?ext=png".to_string()),
    );

    let skew = verifier(&fast_config()).verify_metadata(&locators).await;
    assert!(skew.is_verified());

    let exact = VerifyConfig {
        metadata_only_ceiling: 2,
        image_match: ImageMatchRule::Exact,
        ..fast_config()
    };
    let strict = verifier(&exact).verify_metadata(&locators).await;
    assert!(!strict.is_verified());
}
