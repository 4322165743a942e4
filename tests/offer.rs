//! Tests for offer resolution: by-reference retrieval and authorization
//! server selection.

mod providers;

use oid4vci_wallet::format::FormatRegistry;
use oid4vci_wallet::metadata::SignedMetadataPolicy;
use oid4vci_wallet::offer;
use oid4vci_wallet::types::CredentialOfferRequest;
use oid4vci_wallet::Error;
use serde_json::json;

use crate::providers::{AUTH_SERVER, CREDENTIAL_ISSUER, MockHttp, PID_CONFIGURATION};

// A by-reference offer is fetched before resolution proceeds.
#[tokio::test]
async fn offer_by_reference() {
    let http = MockHttp::new();
    http.enqueue_json(200, &providers::offer_json());
    providers::enqueue_discovery(&http);

    let request =
        CredentialOfferRequest::ByReference(format!("{CREDENTIAL_ISSUER}/offer/1"));
    let resolved = offer::resolve(
        &http,
        &request,
        &SignedMetadataPolicy::IgnoreSigned,
        &FormatRegistry::standard(),
    )
    .await
    .expect("should resolve");

    assert_eq!(resolved.credential_issuer.as_str(), CREDENTIAL_ISSUER);
    assert_eq!(resolved.offered.len(), 1);
    assert_eq!(resolved.offered[0].configuration_id(), PID_CONFIGURATION);
    assert_eq!(resolved.authorization_server.issuer, AUTH_SERVER);

    let requests = http.requests();
    assert_eq!(requests[0].url, format!("{CREDENTIAL_ISSUER}/offer/1"));
}

// A grant naming an authorization server the issuer does not advertise is
// rejected.
#[tokio::test]
async fn offer_grant_pins_unknown_server() {
    let http = MockHttp::new();
    http.enqueue_json(200, &providers::issuer_metadata_json());

    let offer = json!({
        "credential_issuer": CREDENTIAL_ISSUER,
        "credential_configuration_ids": [PID_CONFIGURATION],
        "grants": {
            "authorization_code": {"authorization_server": "https://rogue.example"}
        }
    });
    let request = CredentialOfferRequest::ByValue(offer.to_string());
    let result = offer::resolve(
        &http,
        &request,
        &SignedMetadataPolicy::IgnoreSigned,
        &FormatRegistry::standard(),
    )
    .await;

    assert!(matches!(result, Err(Error::Offer(_))));
}

// An offer whose issuer id is not a valid HTTPS identifier fails
// validation before any metadata fetch.
#[tokio::test]
async fn offer_invalid_issuer_id() {
    let http = MockHttp::new();

    let offer = json!({
        "credential_issuer": "http://issuer.example",
        "credential_configuration_ids": [PID_CONFIGURATION]
    });
    let request = CredentialOfferRequest::ByValue(offer.to_string());
    let result = offer::resolve(
        &http,
        &request,
        &SignedMetadataPolicy::IgnoreSigned,
        &FormatRegistry::standard(),
    )
    .await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(http.requests().is_empty());
}
