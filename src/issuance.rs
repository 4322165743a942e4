//! # Issuance States
//!
//! The typed states an issuance session moves through, and the outcomes of
//! credential submission. Operations on [`crate::issuer::Issuer`] consume a
//! state value and return the next one; a prior state is moved from and
//! cannot be reused.

mod authorize;
mod credential;
mod deferred;
mod nonce;
mod notification;
mod token;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroize;

use crate::types::{IssuedCredential, TokenType};

/// A prepared authorization request: either pushed (PAR) or encoded fully
/// into the authorization URL, together with the PKCE material and state
/// that bind the eventual redirect back to this session.
///
/// The PKCE verifier never leaves the process through this type's `Debug`
/// output, and is zeroized when the value is dropped. Callers that persist
/// state across an interrupted flow can serialize the value; the verifier is
/// included because token exchange cannot succeed without it.
#[derive(Deserialize, Serialize)]
pub struct PreparedAuthorization {
    /// The URL to send the End-User's agent to.
    pub authorization_url: String,

    /// The pushed request reference, when PAR was used.
    pub request_uri: Option<String>,

    /// The `state` parameter bound into the authorization request.
    pub state: String,

    /// The credential configurations authorization was requested for.
    pub configuration_ids: Vec<String>,

    pub(crate) pkce_verifier: String,
}

impl PreparedAuthorization {
    /// The PKCE verifier generated for this request. Exposed for callers
    /// persisting an interrupted flow; handle with the same care as a
    /// credential.
    #[must_use]
    pub fn pkce_verifier(&self) -> &str {
        &self.pkce_verifier
    }
}

impl std::fmt::Debug for PreparedAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedAuthorization")
            .field("authorization_url", &self.authorization_url)
            .field("request_uri", &self.request_uri)
            .field("state", &self.state)
            .field("configuration_ids", &self.configuration_ids)
            .field("pkce_verifier", &"[redacted]")
            .finish()
    }
}

impl Drop for PreparedAuthorization {
    fn drop(&mut self) {
        self.pkce_verifier.zeroize();
    }
}

/// An authorization code received on redirect, bound to the PKCE verifier
/// and configuration ids of the request that produced it. Consumed by token
/// exchange.
#[derive(Deserialize, Serialize)]
pub struct CodeHeld {
    /// The authorization code.
    pub code: String,

    /// The credential configurations the code covers.
    pub configuration_ids: Vec<String>,

    pub(crate) pkce_verifier: String,
}

impl std::fmt::Debug for CodeHeld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeHeld")
            .field("code", &self.code)
            .field("configuration_ids", &self.configuration_ids)
            .field("pkce_verifier", &"[redacted]")
            .finish()
    }
}

impl Drop for CodeHeld {
    fn drop(&mut self) {
        self.pkce_verifier.zeroize();
    }
}

/// An authorized issuance session: an access token, plus the `c_nonce` to
/// bind into proofs of possession once the issuer has handed one out.
///
/// Serializable so callers can persist a session; the serialization
/// preserves token type, refresh token, and nonce.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum AuthorizedRequest {
    /// The issuer has not (yet) issued a nonce; credential requests do not
    /// carry a nonce-bound proof.
    NoProofRequired {
        /// The access token for the credential endpoint.
        access_token: String,

        /// Scheme the token must be presented with.
        token_type: TokenType,

        /// Token to refresh the session with, when granted.
        refresh_token: Option<String>,

        /// Lifetime in seconds of the access token.
        expires_in: Option<i64>,
    },

    /// A `c_nonce` is held and must be bound into the next proof.
    ProofRequired {
        /// The access token for the credential endpoint.
        access_token: String,

        /// Scheme the token must be presented with.
        token_type: TokenType,

        /// Token to refresh the session with, when granted.
        refresh_token: Option<String>,

        /// Lifetime in seconds of the access token.
        expires_in: Option<i64>,

        /// The nonce to sign over in the next proof of possession.
        c_nonce: String,

        /// Lifetime in seconds of the nonce, when the issuer stated one.
        c_nonce_expires_in: Option<i64>,
    },
}

impl AuthorizedRequest {
    /// The access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        match self {
            Self::NoProofRequired { access_token, .. }
            | Self::ProofRequired { access_token, .. } => access_token,
        }
    }

    /// The granted token type.
    #[must_use]
    pub const fn token_type(&self) -> TokenType {
        match self {
            Self::NoProofRequired { token_type, .. }
            | Self::ProofRequired { token_type, .. } => *token_type,
        }
    }

    /// The refresh token, when one was granted.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            Self::NoProofRequired { refresh_token, .. }
            | Self::ProofRequired { refresh_token, .. } => refresh_token.as_deref(),
        }
    }

    /// The current `c_nonce`, when one is held.
    #[must_use]
    pub fn c_nonce(&self) -> Option<&str> {
        match self {
            Self::NoProofRequired { .. } => None,
            Self::ProofRequired { c_nonce, .. } => Some(c_nonce),
        }
    }

    /// Transition with a fresh `c_nonce`, promoting to `ProofRequired` when
    /// necessary.
    #[must_use]
    pub fn with_nonce(self, c_nonce: String, c_nonce_expires_in: Option<i64>) -> Self {
        match self {
            Self::NoProofRequired { access_token, token_type, refresh_token, expires_in }
            | Self::ProofRequired { access_token, token_type, refresh_token, expires_in, .. } => {
                Self::ProofRequired {
                    access_token,
                    token_type,
                    refresh_token,
                    expires_in,
                    c_nonce,
                    c_nonce_expires_in,
                }
            }
        }
    }
}

/// What the wallet asks to be issued: a credential configuration, with an
/// optional format-specific claim set narrowing the requested claims.
///
/// Identifier-based requests are representable but deliberately
/// unsupported; building one fails with
/// [`Error::UnsupportedFeature`](crate::Error::UnsupportedFeature).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssuanceRequestPayload {
    /// Request issuance of a credential configuration.
    ConfigurationBased {
        /// Key into the issuer's `credential_configurations_supported`.
        credential_configuration_id: String,

        /// Format-specific claim set, embedded through the format codec.
        claim_set: Option<Value>,
    },

    /// Request issuance of a credential identifier from the token response.
    IdentifierBased {
        /// Key into the issuer's `credential_configurations_supported`.
        credential_configuration_id: String,

        /// The credential identifier returned in authorization details.
        credential_identifier: String,
    },
}

/// The outcome of a credential request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Credentials were issued.
    Success {
        /// The issued credential(s).
        credentials: Vec<IssuedCredential>,

        /// Identifier for subsequent notification calls.
        notification_id: Option<String>,
    },

    /// Issuance is deferred; redeem the transaction id later.
    Deferred {
        /// Transaction to present at the deferred credential endpoint.
        transaction_id: String,
    },

    /// The proof was rejected and a fresh nonce issued; re-sign and retry.
    /// The accompanying [`AuthorizedRequest`] already carries the fresh
    /// nonce.
    InvalidProof {
        /// The fresh nonce.
        c_nonce: String,

        /// Lifetime of the fresh nonce, when stated.
        c_nonce_expires_in: Option<i64>,

        /// Server-provided hint.
        description: Option<String>,
    },

    /// The issuer refused issuance.
    Failed {
        /// OAuth error code.
        error: String,

        /// Server-provided description.
        description: Option<String>,
    },
}

/// The outcome of polling the deferred credential endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeferredOutcome {
    /// The credential(s) are ready.
    Issued {
        /// The issued credential(s).
        credentials: Vec<IssuedCredential>,

        /// Identifier for subsequent notification calls.
        notification_id: Option<String>,
    },

    /// Issuance has not completed; poll again, no sooner than `interval`
    /// seconds when the issuer stated one.
    Pending {
        /// Minimum seconds to wait before the next poll.
        interval: Option<i64>,
    },

    /// The transaction failed or the id is no longer redeemable.
    Failed {
        /// OAuth error code.
        error: String,

        /// Server-provided description.
        description: Option<String>,
    },
}
