//! Scripted providers shared by the integration tests: a mock HTTP client
//! that replays queued responses and records every request, plus signers
//! over fixed test keys.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use base64ct::{Base64UrlUnpadded, Encoding};
use oid4vci_wallet::jose::{Curve, KeyBinding, KeyType, PublicKeyJwk};
use oid4vci_wallet::jose::jws::Algorithm;
use oid4vci_wallet::provider::{AttestationProvider, HttpClient, HttpResponse, Signer};
use oid4vci_wallet::{Error, Result};
use serde_json::{Value, json};

pub const CREDENTIAL_ISSUER: &str = "https://issuer.example";
pub const AUTH_SERVER: &str = "https://auth.example";
pub const CLIENT_ID: &str = "wallet-client";
pub const REDIRECT_URI: &str = "https://wallet.example/cb";
pub const PID_CONFIGURATION: &str = "eu.europa.ec.eudi.pid_mso_mdoc";

/// A request the mock client saw, as the library sent it.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Option<HashMap<String, String>>,
    pub json: Option<Value>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Replays queued responses in order and records requests for assertions.
#[derive(Default)]
pub struct MockHttp {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enqueue(&self, response: HttpResponse) {
        self.responses.lock().expect("should lock").push_back(response);
    }

    pub fn enqueue_json(&self, status: u16, body: &Value) {
        self.enqueue(HttpResponse {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: serde_json::to_vec(body).expect("should serialize"),
        });
    }

    pub fn enqueue_json_with_headers(
        &self, status: u16, body: &Value, headers: Vec<(String, String)>,
    ) {
        self.enqueue(HttpResponse {
            status,
            headers,
            body: serde_json::to_vec(body).expect("should serialize"),
        });
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("should lock").clone()
    }

    fn respond(&self, recorded: Recorded) -> Result<HttpResponse> {
        self.requests.lock().expect("should lock").push(recorded);
        self.responses
            .lock()
            .expect("should lock")
            .pop_front()
            .ok_or_else(|| Error::Transport("no scripted response left".into()))
    }
}

impl HttpClient for MockHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.respond(Recorded {
            method: "GET",
            url: url.to_string(),
            headers: vec![],
            form: None,
            json: None,
        })
    }

    async fn post_form(
        &self, url: &str, form: &HashMap<String, String>, headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        self.respond(Recorded {
            method: "POST",
            url: url.to_string(),
            headers: headers.to_vec(),
            form: Some(form.clone()),
            json: None,
        })
    }

    async fn post_json(
        &self, url: &str, body: &Value, headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        self.respond(Recorded {
            method: "POST",
            url: url.to_string(),
            headers: headers.to_vec(),
            form: None,
            json: Some(body.clone()),
        })
    }
}

/// Ed25519 signer over a fixed key.
#[derive(Clone)]
pub struct EdSigner {
    key: ed25519_dalek::SigningKey,
}

impl EdSigner {
    pub fn new(seed: u8) -> Self {
        Self {
            key: ed25519_dalek::SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn public_jwk(&self) -> PublicKeyJwk {
        PublicKeyJwk {
            kty: KeyType::Okp,
            crv: Curve::Ed25519,
            x: Base64UrlUnpadded::encode_string(self.key.verifying_key().as_bytes()),
            ..PublicKeyJwk::default()
        }
    }

    pub fn public_jwk_with_kid(&self, kid: &str) -> PublicKeyJwk {
        PublicKeyJwk {
            kid: Some(kid.to_string()),
            ..self.public_jwk()
        }
    }
}

impl Signer for EdSigner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDsa
    }

    fn key_binding(&self) -> KeyBinding {
        KeyBinding::Jwk(self.public_jwk())
    }

    async fn try_sign(&self, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        use ed25519_dalek::Signer as _;
        Ok(self.key.sign(msg).to_vec())
    }
}

/// ES256 signer over a fixed key, for DPoP proofs.
#[derive(Clone)]
pub struct EsSigner {
    key: p256::ecdsa::SigningKey,
}

impl EsSigner {
    pub fn new(seed: u8) -> Self {
        Self {
            key: p256::ecdsa::SigningKey::from_slice(&[seed; 32]).expect("should be a valid key"),
        }
    }

    pub fn public_jwk(&self) -> PublicKeyJwk {
        let point = self.key.verifying_key().to_encoded_point(false);
        PublicKeyJwk {
            kty: KeyType::Ec,
            crv: Curve::P256,
            x: Base64UrlUnpadded::encode_string(point.x().expect("should have x").as_slice()),
            y: Some(Base64UrlUnpadded::encode_string(point.y().expect("should have y").as_slice())),
            ..PublicKeyJwk::default()
        }
    }
}

impl Signer for EsSigner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Es256
    }

    fn key_binding(&self) -> KeyBinding {
        KeyBinding::Jwk(self.public_jwk())
    }

    async fn try_sign(&self, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        use p256::ecdsa::signature::Signer as _;
        let signature: p256::ecdsa::Signature = self.key.sign(msg);
        Ok(signature.to_vec())
    }
}

/// Hands out a canned wallet attestation JWT.
pub struct StaticAttestations(pub String);

impl AttestationProvider for StaticAttestations {
    async fn attestation(&self, _client_id: &str) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Issuer metadata the tests resolve against.
pub fn issuer_metadata_json() -> Value {
    json!({
        "credential_issuer": CREDENTIAL_ISSUER,
        "authorization_servers": [AUTH_SERVER],
        "credential_endpoint": format!("{CREDENTIAL_ISSUER}/credential"),
        "deferred_credential_endpoint": format!("{CREDENTIAL_ISSUER}/deferred"),
        "notification_endpoint": format!("{CREDENTIAL_ISSUER}/notification"),
        "nonce_endpoint": format!("{CREDENTIAL_ISSUER}/nonce"),
        "credential_configurations_supported": {
            PID_CONFIGURATION: {
                "format": "mso_mdoc",
                "doctype": "eu.europa.ec.eudi.pid.1",
                "scope": "eu.europa.ec.eudi.pid_mso_mdoc",
                "proof_types_supported": {
                    "jwt": {"proof_signing_alg_values_supported": ["ES256", "EdDSA"]}
                }
            }
        }
    })
}

/// Authorization server metadata with PAR and DPoP advertised.
pub fn auth_server_json() -> Value {
    json!({
        "issuer": AUTH_SERVER,
        "authorization_endpoint": format!("{AUTH_SERVER}/authorize"),
        "token_endpoint": format!("{AUTH_SERVER}/token"),
        "pushed_authorization_request_endpoint": format!("{AUTH_SERVER}/par"),
        "response_types_supported": ["code"],
        "code_challenge_methods_supported": ["S256"],
        "dpop_signing_alg_values_supported": ["ES256"],
        "token_endpoint_auth_methods_supported": ["none", "attest_jwt_client_auth"]
    })
}

/// An offer carrying both grant types.
pub fn offer_json() -> Value {
    json!({
        "credential_issuer": CREDENTIAL_ISSUER,
        "credential_configuration_ids": [PID_CONFIGURATION],
        "grants": {
            "authorization_code": {"issuer_state": "issuer-state-1"},
            "urn:ietf:params:oauth:grant-type:pre-authorized_code": {
                "pre-authorized_code": "PRE-123",
                "tx_code": {"input_mode": "numeric", "length": 4}
            }
        }
    })
}

/// Queue the two metadata responses `Issuer::resolve` will fetch.
pub fn enqueue_discovery(http: &MockHttp) {
    http.enqueue_json(200, &issuer_metadata_json());
    http.enqueue_json(200, &auth_server_json());
}
