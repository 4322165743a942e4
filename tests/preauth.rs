//! Tests for the issuer-initiated pre-authorized code flow, including the
//! transaction code handling on the token request.

mod providers;

use oid4vci_wallet::client_auth::PublicClient;
use oid4vci_wallet::dpop::NO_DPOP;
use oid4vci_wallet::types::CredentialOfferRequest;
use oid4vci_wallet::{AuthorizedRequest, Error, Issuer, IssuerConfig};
use serde_json::json;

use crate::providers::{
    AUTH_SERVER, CLIENT_ID, MockHttp, PID_CONFIGURATION, enqueue_discovery, offer_json,
};

// Accepting a pre-authorized offer with a transaction code posts the
// expected token request body and yields a proof-required session.
#[tokio::test]
async fn preauth_with_tx_code() {
    let http = MockHttp::new();
    enqueue_discovery(&http);
    http.enqueue_json(
        200,
        &json!({
            "access_token": "at-1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "c_nonce": "CN1",
            "c_nonce_expires_in": 30
        }),
    );

    let request = CredentialOfferRequest::ByValue(offer_json().to_string());
    let issuer = Issuer::resolve(
        http.clone(),
        PublicClient::new(CLIENT_ID),
        NO_DPOP,
        IssuerConfig::default(),
        &request,
    )
    .await
    .expect("should resolve offer");

    let authorized = issuer.pre_authorized(Some("1234".into())).await.expect("should authorize");

    let AuthorizedRequest::ProofRequired { access_token, c_nonce, .. } = &authorized else {
        panic!("expected proof-required state");
    };
    assert_eq!(access_token, "at-1");
    assert_eq!(c_nonce, "CN1");

    let requests = http.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[0].url,
        "https://issuer.example/.well-known/openid-credential-issuer"
    );
    assert_eq!(requests[1].url, format!("{AUTH_SERVER}/.well-known/openid-configuration"));

    let token = &requests[2];
    assert_eq!(token.url, format!("{AUTH_SERVER}/token"));
    let form = token.form.as_ref().expect("should be a form post");
    assert_eq!(
        form.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:pre-authorized_code")
    );
    assert_eq!(form.get("pre-authorized_code").map(String::as_str), Some("PRE-123"));
    assert_eq!(form.get("tx_code").map(String::as_str), Some("1234"));
    assert_eq!(form.get("client_id").map(String::as_str), Some(CLIENT_ID));
}

// A required transaction code that is missing or malformed fails before any
// token request is sent.
#[tokio::test]
async fn preauth_tx_code_required() {
    let http = MockHttp::new();
    enqueue_discovery(&http);

    let request = CredentialOfferRequest::ByValue(offer_json().to_string());
    let issuer = Issuer::resolve(
        http.clone(),
        PublicClient::new(CLIENT_ID),
        NO_DPOP,
        IssuerConfig::default(),
        &request,
    )
    .await
    .expect("should resolve offer");

    let requests_before = http.requests().len();

    let missing = issuer.pre_authorized(None).await;
    assert!(matches!(missing, Err(Error::Validation(_))));

    let wrong_shape = issuer.pre_authorized(Some("12".into())).await;
    assert!(matches!(wrong_shape, Err(Error::Validation(_))));

    let not_numeric = issuer.pre_authorized(Some("12a4".into())).await;
    assert!(matches!(not_numeric, Err(Error::Validation(_))));

    assert_eq!(http.requests().len(), requests_before);
}

// An offer referencing a configuration the issuer does not advertise is
// rejected at resolution.
#[tokio::test]
async fn offer_unknown_configuration() {
    let http = MockHttp::new();
    enqueue_discovery(&http);

    let offer = json!({
        "credential_issuer": "https://issuer.example",
        "credential_configuration_ids": ["no.such.configuration"]
    });
    let request = CredentialOfferRequest::ByValue(offer.to_string());
    let result = Issuer::resolve(
        http.clone(),
        PublicClient::new(CLIENT_ID),
        NO_DPOP,
        IssuerConfig::default(),
        &request,
    )
    .await;

    assert!(matches!(result, Err(Error::Offer(_))));
}

// Every configuration id in a resolved offer is a key of the issuer's
// supported set.
#[tokio::test]
async fn resolved_offer_ids_are_supported() {
    let http = MockHttp::new();
    enqueue_discovery(&http);

    let request = CredentialOfferRequest::ByValue(offer_json().to_string());
    let issuer = Issuer::resolve(
        http.clone(),
        PublicClient::new(CLIENT_ID),
        NO_DPOP,
        IssuerConfig::default(),
        &request,
    )
    .await
    .expect("should resolve offer");

    let offer = issuer.offer();
    for offered in &offer.offered {
        assert!(
            offer
                .issuer_metadata
                .credential_configurations_supported
                .contains_key(offered.configuration_id())
        );
    }
    assert_eq!(offer.offered[0].configuration_id(), PID_CONFIGURATION);
}
