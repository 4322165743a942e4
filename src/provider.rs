//! # Provider
//!
//! The provider traits are used to inject external collaborators into the
//! library: HTTP transport, signing keys, wallet attestations, and response
//! decryption. `OpenID4VCI` is oriented towards HTTP, but the traits keep
//! the library transport and JOSE-implementation agnostic.

use std::collections::HashMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, OAuthErrorResponse, Result};
use crate::jose::jws::{Algorithm, KeyBinding};
use crate::jose::jwk::PublicKeyJwk;
use crate::types::SupportedResponseEncryption;

/// Response header carrying a server-issued DPoP nonce (RFC 9449).
pub const DPOP_NONCE_HEADER: &str = "DPoP-Nonce";

/// An HTTP response, returned for any completed exchange, success or not.
///
/// Non-2xx responses are values, not errors: higher layers need the status,
/// body, and headers to detect `use_dpop_nonce` recovery and structured
/// OAuth errors.
#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response headers as received.
    pub headers: Vec<(String, String)>,

    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// `true` for 2xx status codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Look up a header value, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `DPoP-Nonce` header, if present.
    #[must_use]
    pub fn dpop_nonce(&self) -> Option<&str> {
        self.header(DPOP_NONCE_HEADER)
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::Transport(format!("issue decoding response body: {e}")))
    }

    /// Interpret the body as a structured OAuth error, if it is one.
    #[must_use]
    pub fn oauth_error(&self) -> Option<OAuthErrorResponse> {
        serde_json::from_slice::<OAuthErrorResponse>(&self.body)
            .ok()
            .filter(|e| !e.error.is_empty())
    }

    /// The body as a UTF-8 string (lossy).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Pluggable HTTP transport.
///
/// Implementations map requests to responses; they must complete each
/// exchange (returning non-2xx responses as values) and only fail with
/// `Error::Transport` or `Error::Timeout` for network-level problems. The
/// `DPoP-Nonce` response header must be preserved. Implementations must
/// tolerate concurrent invocation from distinct issuance sessions.
pub trait HttpClient: Send + Sync {
    /// Issue a GET request.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// Issue a POST request with an `application/x-www-form-urlencoded` body.
    fn post_form(
        &self, url: &str, form: &HashMap<String, String>, headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse>> + Send;

    /// Issue a POST request with an `application/json` body.
    fn post_json(
        &self, url: &str, body: &Value, headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse>> + Send;
}

impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>> + Send {
        (**self).get(url)
    }

    fn post_form(
        &self, url: &str, form: &HashMap<String, String>, headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse>> + Send {
        (**self).post_form(url, form, headers)
    }

    fn post_json(
        &self, url: &str, body: &Value, headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse>> + Send {
        (**self).post_json(url, body, headers)
    }
}

/// Signer is implemented by holders of private keys: the DPoP key, proof of
/// possession keys, and the client attestation key. Keys never leave the
/// implementation.
pub trait Signer: Send + Sync {
    /// The algorithm used by the signer.
    fn algorithm(&self) -> Algorithm;

    /// The verification key material a relying party should use: an embedded
    /// JWK or a resolvable key id. DPoP proofs require a JWK binding.
    fn key_binding(&self) -> KeyBinding;

    /// Sign the message, returning the raw signature bytes.
    fn try_sign(&self, msg: &[u8]) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;
}

impl<T: Signer + ?Sized> Signer for &T {
    fn algorithm(&self) -> Algorithm {
        (**self).algorithm()
    }

    fn key_binding(&self) -> KeyBinding {
        (**self).key_binding()
    }

    fn try_sign(&self, msg: &[u8]) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send {
        (**self).try_sign(msg)
    }
}

/// Supplies wallet attestation JWTs for Attestation-Based Client
/// Authentication. Attestation issuance itself is out of scope; this trait
/// only hands over a previously obtained attestation for the client key.
pub trait AttestationProvider: Send + Sync {
    /// A compact-serialized wallet attestation JWT for the given client.
    fn attestation(&self, client_id: &str)
    -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Ephemeral key material for credential response encryption. The private
/// key stays with the [`ResponseDecryptor`] that minted it, addressed by an
/// opaque handle; only the public JWK is sent to the issuer.
#[derive(Clone, Debug)]
pub struct ResponseEncryptionSpec {
    /// Public key the issuer encrypts to.
    pub jwk: PublicKeyJwk,

    /// Opaque handle to the private key held by the provider.
    pub key_handle: String,

    /// JWE `alg` to request. Must be advertised by the issuer.
    pub alg: String,

    /// JWE `enc` to request. Must be advertised by the issuer.
    pub enc: String,
}

/// Provides ephemeral keys for credential response encryption and decrypts
/// the issuer's JWE replies.
///
/// Implementations must never log private keys and must zeroize them once
/// the handle is released.
pub trait ResponseDecryptor: Send + Sync {
    /// Generate an ephemeral key pair suitable for the issuer's advertised
    /// capabilities, returning the public half and a private key handle.
    fn prepare(
        &self, supported: &SupportedResponseEncryption,
    ) -> impl Future<Output = anyhow::Result<ResponseEncryptionSpec>> + Send;

    /// Decrypt a compact-serialized JWE with the key behind `key_handle`,
    /// returning the plaintext. The implementation should release and
    /// zeroize the key afterwards.
    fn decrypt(
        &self, key_handle: &str, jwe: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;
}

/// Uninhabited [`ResponseDecryptor`] for credential requests that do not
/// use response encryption: pass [`NoEncryption::NONE`].
pub enum NoEncryption {}

impl NoEncryption {
    /// The `encryption` argument for unencrypted credential requests.
    pub const NONE: Option<&'static Self> = None;
}

impl ResponseDecryptor for NoEncryption {
    async fn prepare(
        &self, _supported: &SupportedResponseEncryption,
    ) -> anyhow::Result<ResponseEncryptionSpec> {
        match *self {}
    }

    async fn decrypt(&self, _key_handle: &str, _jwe: &str) -> anyhow::Result<Vec<u8>> {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_case_insensitive() {
        let response = HttpResponse {
            status: 401,
            headers: vec![("dpop-nonce".into(), "N1".into())],
            body: vec![],
        };
        assert_eq!(response.dpop_nonce(), Some("N1"));
        assert!(!response.is_success());
    }

    #[test]
    fn oauth_error_requires_error_member() {
        let response = HttpResponse {
            status: 400,
            headers: vec![],
            body: br#"{"message": "nope"}"#.to_vec(),
        };
        assert!(response.oauth_error().is_none());
    }
}
