//! # Errors
//!
//! The closed error taxonomy surfaced by every operation in this crate,
//! together with the OAuth 2.0 error body shape used on the wire.
//!
//! Recovery policy: `use_dpop_nonce` is recovered transparently exactly once
//! per request (see [`crate::dpop`]); `InvalidProof` is surfaced so the
//! caller can re-sign with the refreshed `c_nonce` and retry; everything
//! else is terminal for the current operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by offer resolution, authorization, and issuance.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied input is malformed: an invalid URL, an empty token,
    /// an unknown credential configuration id, a missing required
    /// transaction code, and the like.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Issuer or authorization server metadata could not be obtained or is
    /// unusable: discovery unreachable, required fields missing, or signed
    /// metadata failing verification.
    #[error("metadata invalid: {0}")]
    Metadata(String),

    /// The credential offer cannot be parsed or references credential
    /// configurations the issuer does not advertise.
    #[error("credential offer invalid: {0}")]
    Offer(String),

    /// A network-level failure, or a non-2xx response that carries no
    /// structured OAuth error body.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The operation timed out in the HTTP client. Never retried by this
    /// crate.
    #[error("request timed out")]
    Timeout,

    /// A structured OAuth 2.0 error returned by the authorization server or
    /// credential issuer.
    #[error("{error}: {}", error_description.as_deref().unwrap_or("no description"))]
    OAuth {
        /// OAuth error code (e.g. `invalid_grant`, `invalid_request`).
        error: String,

        /// Human-readable description, when the server provided one.
        error_description: Option<String>,

        /// URI with further information, when the server provided one.
        error_uri: Option<String>,
    },

    /// The credential endpoint rejected the proof of possession and issued a
    /// fresh `c_nonce` to sign over on retry.
    #[error("invalid proof: {}", description.as_deref().unwrap_or("no description"))]
    InvalidProof {
        /// Fresh nonce to bind into the next proof JWT.
        c_nonce: String,

        /// Lifetime of the fresh nonce, when stated.
        c_nonce_expires_in: Option<i64>,

        /// Server-provided hint.
        description: Option<String>,
    },

    /// A signing, verification, or decryption failure.
    #[error("cryptographic failure: {0}")]
    Cryptographic(String),

    /// The requested behavior is recognised but deliberately not supported,
    /// e.g. identifier-based credential requests.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
}

/// OAuth 2.0 error response body, as returned by authorization server and
/// issuer endpoints.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OAuthErrorResponse {
    /// Error code.
    pub error: String,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// URI with further information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,

    /// Fresh `c_nonce`, present on `invalid_proof` errors from the
    /// credential endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,

    /// Lifetime in seconds of the fresh `c_nonce`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<i64>,

    /// Minimum seconds to wait before re-polling the deferred endpoint,
    /// present on `issuance_pending` errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
}

impl From<OAuthErrorResponse> for Error {
    fn from(body: OAuthErrorResponse) -> Self {
        Self::OAuth {
            error: body.error,
            error_description: body.error_description,
            error_uri: body.error_uri,
        }
    }
}

/// OAuth error codes with protocol-level meaning to this crate.
pub mod code {
    /// The server requires a (new) DPoP nonce (RFC 9449 §8).
    pub const USE_DPOP_NONCE: &str = "use_dpop_nonce";

    /// The DPoP proof was rejected.
    pub const INVALID_DPOP_PROOF: &str = "invalid_dpop_proof";

    /// The key proof in a credential request was rejected.
    pub const INVALID_PROOF: &str = "invalid_proof";

    /// Deferred issuance has not completed yet.
    pub const ISSUANCE_PENDING: &str = "issuance_pending";

    /// The deferred transaction id is unknown or already redeemed.
    pub const INVALID_TRANSACTION_ID: &str = "invalid_transaction_id";
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn oauth_error_round_trip() {
        let body: OAuthErrorResponse = serde_json::from_value(json!({
            "error": "invalid_proof",
            "c_nonce": "CN2",
            "c_nonce_expires_in": 5
        }))
        .expect("should deserialize");

        assert_eq!(body.error, code::INVALID_PROOF);
        assert_eq!(body.c_nonce.as_deref(), Some("CN2"));
        assert_eq!(body.c_nonce_expires_in, Some(5));
        assert_eq!(body.interval, None);
    }

    #[test]
    fn error_display() {
        let err = Error::OAuth {
            error: "invalid_grant".into(),
            error_description: Some("code expired".into()),
            error_uri: None,
        };
        assert_eq!(err.to_string(), "invalid_grant: code expired");
    }
}
