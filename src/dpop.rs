//! # DPoP
//!
//! Construction of DPoP proofs (RFC 9449) and management of server-issued
//! DPoP nonces. One engine is bound per issuer + authorization server pair;
//! sessions sharing a binding share the engine (and so its nonce cell)
//! through `Clone`.

use std::sync::{Arc, Mutex, PoisonError};

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result, code};
use crate::jose::jws::{self, Algorithm, JwtType, KeyBinding};
use crate::provider::{HttpResponse, Signer};

/// Claims of a DPoP proof JWT (RFC 9449 §4.2).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DpopClaims {
    /// Unique identifier for this proof; proofs are one-shot.
    pub jti: String,

    /// The HTTP method of the request the proof accompanies.
    pub htm: String,

    /// The HTTP target URI, without query and fragment parts.
    pub htu: String,

    /// Time the proof was created.
    pub iat: i64,

    /// Base64url-encoded SHA-256 hash of the access token, when the request
    /// carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ath: Option<String>,

    /// The most recent nonce provided by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Builds DPoP proofs and tracks the server-provided nonce.
#[derive(Clone)]
pub struct DpopEngine<S: Signer> {
    signer: Arc<S>,
    nonce: Arc<Mutex<Option<String>>>,
}

impl<S: Signer> DpopEngine<S> {
    /// Create an engine around a DPoP signing key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cryptographic` when the signer cannot provide an
    /// embeddable JWK. DPoP proofs require one.
    pub fn new(signer: S) -> Result<Self> {
        let KeyBinding::Jwk(_) = signer.key_binding() else {
            return Err(Error::Cryptographic(
                "DPoP requires a signer with an embeddable JWK".into(),
            ));
        };
        Ok(Self {
            signer: Arc::new(signer),
            nonce: Arc::new(Mutex::new(None)),
        })
    }

    /// The algorithm the engine signs proofs with.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.signer.algorithm()
    }

    /// The current server-provided nonce, if any.
    #[must_use]
    pub fn nonce(&self) -> Option<String> {
        self.nonce.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Seed the nonce cell, e.g. when restoring a session a caller persisted
    /// mid-flow.
    pub fn restore_nonce(&self, nonce: impl Into<String>) {
        let mut cell = self.nonce.lock().unwrap_or_else(PoisonError::into_inner);
        *cell = Some(nonce.into());
    }

    /// Record the `DPoP-Nonce` header of any response, success or failure.
    pub fn observe(&self, response: &HttpResponse) {
        if let Some(nonce) = response.dpop_nonce() {
            let mut cell = self.nonce.lock().unwrap_or_else(PoisonError::into_inner);
            *cell = Some(nonce.to_string());
        }
    }

    /// Build a DPoP proof for an outgoing request. `htu` is stripped of
    /// query and fragment per RFC 9449; `ath` is included when an access
    /// token accompanies the request; the current nonce is bound when set.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cryptographic` when signing fails.
    pub async fn proof(
        &self, htm: &str, htu: &str, access_token: Option<&str>,
    ) -> Result<String> {
        let claims = DpopClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            htm: htm.to_string(),
            htu: strip_htu(htu).to_string(),
            iat: Utc::now().timestamp(),
            ath: access_token.map(|token| {
                Base64UrlUnpadded::encode_string(&Sha256::digest(token.as_bytes()))
            }),
            nonce: self.nonce(),
        };

        jws::encode(JwtType::DpopJwt, &claims, self.signer.as_ref())
            .await
            .map_err(|e| Error::Cryptographic(format!("issue signing DPoP proof: {e}")))
    }
}

/// Uninhabited [`Signer`] for sessions that do not use DPoP: pass
/// [`NO_DPOP`] where an `Option<DpopEngine<_>>` is expected.
pub enum NoDpop {}

impl Signer for NoDpop {
    fn algorithm(&self) -> Algorithm {
        match *self {}
    }

    fn key_binding(&self) -> KeyBinding {
        match *self {}
    }

    async fn try_sign(&self, _msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        match *self {}
    }
}

/// The `dpop` argument for sessions without DPoP.
pub const NO_DPOP: Option<DpopEngine<NoDpop>> = None;

/// Strip query and fragment from a URL, per the `htu` claim rules.
#[must_use]
pub fn strip_htu(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Whether a response asks for a (new) DPoP nonce to be bound and the
/// request retried: a `use_dpop_nonce` or `invalid_dpop_proof` error body
/// accompanied by a fresh `DPoP-Nonce` header. The retry is one-shot; a
/// second occurrence without progress is terminal.
#[must_use]
pub fn wants_nonce_retry(response: &HttpResponse) -> bool {
    if response.is_success() || response.dpop_nonce().is_none() {
        return false;
    }
    response.oauth_error().is_some_and(|body| {
        body.error == code::USE_DPOP_NONCE || body.error == code::INVALID_DPOP_PROOF
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn htu_stripping() {
        assert_eq!(strip_htu("https://as.example/token?foo=1"), "https://as.example/token");
        assert_eq!(strip_htu("https://as.example/token#frag"), "https://as.example/token");
        assert_eq!(strip_htu("https://as.example/token"), "https://as.example/token");
    }

    #[test]
    fn nonce_retry_detection() {
        let retryable = HttpResponse {
            status: 401,
            headers: vec![("DPoP-Nonce".into(), "N1".into())],
            body: br#"{"error": "use_dpop_nonce"}"#.to_vec(),
        };
        assert!(wants_nonce_retry(&retryable));

        // no fresh nonce to bind, nothing to retry with
        let no_header = HttpResponse {
            status: 401,
            headers: vec![],
            body: br#"{"error": "use_dpop_nonce"}"#.to_vec(),
        };
        assert!(!wants_nonce_retry(&no_header));

        let unrelated = HttpResponse {
            status: 400,
            headers: vec![("DPoP-Nonce".into(), "N1".into())],
            body: br#"{"error": "invalid_grant"}"#.to_vec(),
        };
        assert!(!wants_nonce_retry(&unrelated));
    }
}
