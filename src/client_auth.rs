//! # Client Authentication
//!
//! How the wallet authenticates at the authorization server: as a public
//! client (its `client_id` only), or through Attestation-Based Client
//! Authentication: a wallet attestation JWT obtained from a provider plus
//! a proof-of-possession JWT signed by the client key, sent as the
//! `OAuth-Client-Attestation` and `OAuth-Client-Attestation-PoP` headers.

use std::collections::HashMap;
use std::future::Future;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::jose::jws::{self, JwtType};
use crate::provider::{AttestationProvider, Signer};

/// Header conveying the wallet attestation JWT.
pub const ATTESTATION_HEADER: &str = "OAuth-Client-Attestation";

/// Header conveying the client's attestation proof of possession.
pub const ATTESTATION_POP_HEADER: &str = "OAuth-Client-Attestation-PoP";

// Lifetime of an attestation PoP JWT.
const POP_LIFETIME_SECS: i64 = 300;

/// Applies client authentication to authorization and token requests:
/// contributing form parameters, headers, or both.
pub trait ClientAuthenticator: Send + Sync {
    /// The wallet's OAuth 2.0 client identifier.
    fn client_id(&self) -> &str;

    /// Authenticate an outgoing request to the given authorization server,
    /// mutating the form body and returning headers to attach.
    fn authenticate(
        &self, as_issuer: &str, form: &mut HashMap<String, String>,
    ) -> impl Future<Output = Result<Vec<(String, String)>>> + Send;
}

/// A public client: `client_id` in the request body, nothing else.
#[derive(Clone, Debug)]
pub struct PublicClient {
    client_id: String,
}

impl PublicClient {
    /// A public client with the given identifier.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self { client_id: client_id.into() }
    }
}

impl ClientAuthenticator for PublicClient {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn authenticate(
        &self, _as_issuer: &str, form: &mut HashMap<String, String>,
    ) -> Result<Vec<(String, String)>> {
        form.insert("client_id".to_string(), self.client_id.clone());
        Ok(vec![])
    }
}

/// Claims of the client attestation proof-of-possession JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AttestationPopClaims {
    /// The wallet's client identifier.
    pub iss: String,

    /// The authorization server's issuer identifier.
    pub aud: String,

    /// Time the proof was created.
    pub iat: i64,

    /// Expiry of the proof.
    pub exp: i64,

    /// Unique identifier for this proof.
    pub jti: String,

    /// Challenge nonce issued by the authorization server, when one was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// An attested client: wallet attestation JWT plus a PoP JWT signed by the
/// client key, per Attestation-Based Client Authentication.
#[derive(Clone, Debug)]
pub struct AttestedClient<A: AttestationProvider, S: Signer> {
    client_id: String,
    attestations: A,
    pop_signer: S,
    challenge: Option<String>,
}

impl<A: AttestationProvider, S: Signer> AttestedClient<A, S> {
    /// An attested client for the given identifier, attestation source, and
    /// client key.
    #[must_use]
    pub fn new(client_id: impl Into<String>, attestations: A, pop_signer: S) -> Self {
        Self {
            client_id: client_id.into(),
            attestations,
            pop_signer,
            challenge: None,
        }
    }

    /// Bind a server-issued challenge nonce into subsequent PoP JWTs.
    #[must_use]
    pub fn with_challenge(mut self, nonce: impl Into<String>) -> Self {
        self.challenge = Some(nonce.into());
        self
    }
}

impl<A: AttestationProvider, S: Signer> ClientAuthenticator for AttestedClient<A, S> {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn authenticate(
        &self, as_issuer: &str, form: &mut HashMap<String, String>,
    ) -> Result<Vec<(String, String)>> {
        form.insert("client_id".to_string(), self.client_id.clone());

        let attestation = self
            .attestations
            .attestation(&self.client_id)
            .await
            .map_err(|e| Error::Cryptographic(format!("issue obtaining attestation: {e}")))?;

        let iat = Utc::now().timestamp();
        let claims = AttestationPopClaims {
            iss: self.client_id.clone(),
            aud: as_issuer.to_string(),
            iat,
            exp: iat + POP_LIFETIME_SECS,
            jti: uuid::Uuid::new_v4().to_string(),
            nonce: self.challenge.clone(),
        };
        let pop = jws::encode(JwtType::ClientAttestationPopJwt, &claims, &self.pop_signer)
            .await
            .map_err(|e| Error::Cryptographic(format!("issue signing attestation PoP: {e}")))?;

        Ok(vec![
            (ATTESTATION_HEADER.to_string(), attestation),
            (ATTESTATION_POP_HEADER.to_string(), pop),
        ])
    }
}
