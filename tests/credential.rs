//! Tests for credential submission outcomes: proof nonce binding, invalid
//! proof recovery, deferred issuance, and notifications.

mod providers;

use oid4vci_wallet::client_auth::PublicClient;
use oid4vci_wallet::dpop::NO_DPOP;
use oid4vci_wallet::jose::jws;
use oid4vci_wallet::provider::NoEncryption;
use oid4vci_wallet::types::{CredentialOfferRequest, NotificationRequest};
use oid4vci_wallet::{
    DeferredOutcome, Error, Issuer, IssuanceRequestPayload, IssuerConfig, SubmissionOutcome,
};
use serde_json::json;

use crate::providers::{
    CLIENT_ID, CREDENTIAL_ISSUER, EdSigner, MockHttp, PID_CONFIGURATION, enqueue_discovery,
    offer_json,
};

type Session = Issuer<
    std::sync::Arc<MockHttp>,
    PublicClient,
    oid4vci_wallet::dpop::NoDpop,
>;

// Resolve the offer and authorize with the pre-authorized code; the token
// response carries c_nonce CN1.
async fn authorized_session(
    http: &std::sync::Arc<MockHttp>,
) -> (Session, oid4vci_wallet::AuthorizedRequest) {
    enqueue_discovery(http);
    http.enqueue_json(
        200,
        &json!({
            "access_token": "at-1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "c_nonce": "CN1"
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
    (issuer, authorized)
}

fn payload() -> IssuanceRequestPayload {
    IssuanceRequestPayload::ConfigurationBased {
        credential_configuration_id: PID_CONFIGURATION.to_string(),
        claim_set: None,
    }
}

// The proof JWT binds the c_nonce from the token response; a successful
// response yields the issued credential and the notification id.
#[tokio::test]
async fn proof_binds_current_nonce() {
    let http = MockHttp::new();
    let (issuer, authorized) = authorized_session(&http).await;

    http.enqueue_json(
        200,
        &json!({
            "credentials": [{"credential": "eyJhbGciOi..."}],
            "notification_id": "n-1"
        }),
    );

    let (new_authorized, outcome) = issuer
        .request_credential(authorized, &payload(), &[EdSigner::new(9)], NoEncryption::NONE)
        .await
        .expect("should submit");

    let SubmissionOutcome::Success { credentials, notification_id } = outcome else {
        panic!("expected success");
    };
    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0].credential, json!("eyJhbGciOi..."));
    assert_eq!(notification_id.as_deref(), Some("n-1"));

    // no fresh nonce in the response, CN1 is still held
    assert_eq!(new_authorized.c_nonce(), Some("CN1"));

    let requests = http.requests();
    let credential = requests.last().expect("should have requests");
    assert_eq!(credential.url, format!("{CREDENTIAL_ISSUER}/credential"));
    assert_eq!(credential.header("Authorization"), Some("Bearer at-1"));

    let body = credential.json.as_ref().expect("should be a json post");
    assert_eq!(body["credential_configuration_id"], json!(PID_CONFIGURATION));

    let proof = body["proof"]["jwt"].as_str().expect("should carry a proof JWT");
    let parts = jws::decode_parts(proof).expect("should decode");
    assert_eq!(parts.header["typ"], json!("openid4vci-proof+jwt"));
    assert_eq!(parts.claims["nonce"], json!("CN1"));
    assert_eq!(parts.claims["aud"], json!(CREDENTIAL_ISSUER));
    assert_eq!(parts.claims["iss"], json!(CLIENT_ID));
}

// An invalid_proof rejection surfaces the fresh c_nonce in both the outcome
// and the successor session state.
#[tokio::test]
async fn invalid_proof_surfaces_fresh_nonce() {
    let http = MockHttp::new();
    let (issuer, authorized) = authorized_session(&http).await;

    http.enqueue_json(
        400,
        &json!({"error": "invalid_proof", "c_nonce": "CN2", "c_nonce_expires_in": 5}),
    );

    let (new_authorized, outcome) = issuer
        .request_credential(authorized, &payload(), &[EdSigner::new(9)], NoEncryption::NONE)
        .await
        .expect("should complete with an outcome");

    let SubmissionOutcome::InvalidProof { c_nonce, c_nonce_expires_in, .. } = outcome else {
        panic!("expected invalid proof outcome");
    };
    assert_eq!(c_nonce, "CN2");
    assert_eq!(c_nonce_expires_in, Some(5));
    assert_eq!(new_authorized.c_nonce(), Some("CN2"));

    // retrying with the refreshed state binds CN2
    http.enqueue_json(200, &json!({"credentials": [{"credential": "ey2"}]}));
    let (_, outcome) = issuer
        .request_credential(new_authorized, &payload(), &[EdSigner::new(9)], NoEncryption::NONE)
        .await
        .expect("should submit");
    assert!(matches!(outcome, SubmissionOutcome::Success { .. }));

    let retry = http.requests().last().expect("should have requests").clone();
    let body = retry.json.expect("should be a json post");
    let proof = body["proof"]["jwt"].as_str().expect("should carry a proof JWT");
    let parts = jws::decode_parts(proof).expect("should decode");
    assert_eq!(parts.claims["nonce"], json!("CN2"));
}

// Deferred issuance: transaction id comes back, polling reports pending
// with the stated interval, then the credential arrives.
#[tokio::test]
async fn deferred_issuance_progression() {
    let http = MockHttp::new();
    let (issuer, authorized) = authorized_session(&http).await;

    http.enqueue_json(200, &json!({"transaction_id": "tx-7"}));
    let (authorized, outcome) = issuer
        .request_credential(authorized, &payload(), &[EdSigner::new(9)], NoEncryption::NONE)
        .await
        .expect("should submit");
    let SubmissionOutcome::Deferred { transaction_id } = outcome else {
        panic!("expected deferred outcome");
    };
    assert_eq!(transaction_id, "tx-7");

    http.enqueue_json(202, &json!({"error": "issuance_pending", "interval": 5}));
    let (authorized, outcome) = issuer
        .query_for_deferred(authorized, &transaction_id)
        .await
        .expect("should poll");
    assert_eq!(outcome, DeferredOutcome::Pending { interval: Some(5) });

    http.enqueue_json(200, &json!({"credentials": [{"credential": "ey..."}]}));
    let (_, outcome) = issuer
        .query_for_deferred(authorized, &transaction_id)
        .await
        .expect("should poll");
    let DeferredOutcome::Issued { credentials, .. } = outcome else {
        panic!("expected issued outcome");
    };
    assert_eq!(credentials.len(), 1);

    let poll = http.requests().last().expect("should have requests").clone();
    assert_eq!(poll.url, format!("{CREDENTIAL_ISSUER}/deferred"));
    assert_eq!(poll.json, Some(json!({"transaction_id": "tx-7"})));
}

// Notification posting is non-fatal bookkeeping: the expected body is
// posted with the session's token.
#[tokio::test]
async fn notify_posts_event() {
    let http = MockHttp::new();
    let (issuer, authorized) = authorized_session(&http).await;

    http.enqueue(oid4vci_wallet::provider::HttpResponse {
        status: 204,
        headers: vec![],
        body: vec![],
    });
    issuer
        .notify(&authorized, &NotificationRequest::accepted("n-1"))
        .await
        .expect("should notify");

    let notify = http.requests().last().expect("should have requests").clone();
    assert_eq!(notify.url, format!("{CREDENTIAL_ISSUER}/notification"));
    assert_eq!(
        notify.json,
        Some(json!({"notification_id": "n-1", "event": "credential_accepted"}))
    );
    assert_eq!(notify.header("Authorization"), Some("Bearer at-1"));
}

// The nonce endpoint proactively refreshes the held c_nonce.
#[tokio::test]
async fn nonce_endpoint_refreshes_state() {
    let http = MockHttp::new();
    let (issuer, authorized) = authorized_session(&http).await;

    http.enqueue_json(200, &json!({"c_nonce": "CN9"}));
    let authorized = issuer.fresh_nonce(authorized).await.expect("should fetch nonce");
    assert_eq!(authorized.c_nonce(), Some("CN9"));

    let nonce = http.requests().last().expect("should have requests").clone();
    assert_eq!(nonce.url, format!("{CREDENTIAL_ISSUER}/nonce"));
}

// Identifier-based payloads are deliberately unsupported.
#[tokio::test]
async fn identifier_based_is_unsupported() {
    let http = MockHttp::new();
    let (issuer, authorized) = authorized_session(&http).await;

    let result = issuer
        .request_credential(
            authorized,
            &IssuanceRequestPayload::IdentifierBased {
                credential_configuration_id: PID_CONFIGURATION.to_string(),
                credential_identifier: "pid-1".to_string(),
            },
            &[EdSigner::new(9)],
            NoEncryption::NONE,
        )
        .await;

    assert!(matches!(result, Err(Error::UnsupportedFeature(_))));
}

// The issuer requiring response encryption without the wallet providing a
// decryptor is a validation failure before any network call.
#[tokio::test]
async fn required_encryption_must_be_provided() {
    // metadata requiring encryption
    let mut metadata = providers::issuer_metadata_json();
    metadata["credential_response_encryption"] = json!({
        "alg_values_supported": ["ECDH-ES"],
        "enc_values_supported": ["A256GCM"],
        "encryption_required": true
    });
    let http = MockHttp::new();
    http.enqueue_json(200, &metadata);
    http.enqueue_json(200, &providers::auth_server_json());
    http.enqueue_json(
        200,
        &json!({"access_token": "at-1", "token_type": "Bearer", "c_nonce": "CN1"}),
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

    let before = http.requests().len();
    let result = issuer
        .request_credential(authorized, &payload(), &[EdSigner::new(9)], NoEncryption::NONE)
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(http.requests().len(), before);
}
