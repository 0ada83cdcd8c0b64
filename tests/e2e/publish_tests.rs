//! Upload-then-verify flows through `Publisher`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::{GatewayUploader, TestGateway};
use nft_publish::{
    AssetBundle, Error, HttpFetcher, PublishRequest, PublishVerifier, Publisher,
    VerificationOutcome, VerifyConfig,
};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;

const IMAGE: &[u8] = b"\x89PNG\r\n\x1a\n not really a png, but bytes are bytes";

fn fast_config() -> VerifyConfig {
    VerifyConfig {
        base_delay_ms: 1,
        ..VerifyConfig::default()
    }
}

fn request() -> PublishRequest {
    let manifest = json!({
        "name": "Number #0001",
        "symbol": "NB",
        "image": "0.png",
        "seller_fee_basis_points": 500,
        "attributes": [{ "trait_type": "background", "value": "blue" }],
        "properties": {
            "files": [{ "uri": "0.png", "type": "image/png" }],
            "creators": [{ "address": "BPr18DCdtzASf1YVbUVZ4dZ7mA6jpMYZSUP3YuiMgGeD", "share": 100 }]
        }
    });
    PublishRequest::new(AssetBundle::new(IMAGE.to_vec()), manifest).expect("request")
}

fn publisher(uploader: GatewayUploader) -> Publisher<GatewayUploader, HttpFetcher> {
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).expect("client");
    Publisher::new(uploader, PublishVerifier::new(fetcher, &fast_config()))
}

#[tokio::test]
async fn test_publish_verified_immediately() {
    let gateway = TestGateway::start().await;
    let publisher = publisher(GatewayUploader::new(gateway.clone()));

    let outcome = publisher.publish(&request()).await.expect("publish");

    match outcome {
        VerificationOutcome::Verified {
            locators, attempts, ..
        } => {
            assert_eq!(attempts, 1);
            assert!(locators.metadata_uri.starts_with(&gateway.uri()));
            assert!(locators.image_uri.is_some());
        }
        other => panic!("expected verified, got {other:?}"),
    }
}

#[tokio::test]
async fn test_publish_waits_for_propagation() {
    let gateway = TestGateway::start().await;
    let publisher = publisher(GatewayUploader::new(gateway.clone()).with_propagation_delay(3));

    let outcome = publisher.publish(&request()).await.expect("publish");

    // Three metadata 404s, then three image 404s on attempts that fetched
    // good metadata; both hold together on attempt seven.
    assert!(matches!(
        outcome,
        VerificationOutcome::Verified { attempts: 7, .. }
    ));
    let digest = AssetBundle::new(IMAGE.to_vec()).digest().to_string();
    assert_eq!(gateway.hits(&format!("/{digest}.json")).await, 7);
    assert_eq!(gateway.hits(&format!("/{digest}")).await, 4);
}

#[tokio::test]
async fn test_publish_corrupt_image_fails_with_locators() {
    let gateway = TestGateway::start().await;
    let publisher = publisher(GatewayUploader::new(gateway.clone()).with_corrupt_image());

    let outcome = publisher.publish(&request()).await.expect("publish");

    match outcome {
        VerificationOutcome::Failed {
            locators,
            attempts_exhausted,
            ..
        } => {
            assert_eq!(attempts_exhausted, 8);
            let image_uri = locators.image_uri.expect("image locator kept");
            let route = image_uri.trim_start_matches(&gateway.uri()).to_string();
            assert_eq!(gateway.hits(&route).await, 8);
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_failure_surfaces_immediately() {
    let gateway = TestGateway::start().await;
    let uploader = GatewayUploader::new(gateway.clone()).failing();
    let calls = uploader.calls();
    let publisher = publisher(uploader);

    let err = publisher.publish(&request()).await.expect_err("upload fails");

    assert!(matches!(err, Error::Upload(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.total_hits().await, 0);
}
