//! Credential endpoint request and response types, plus the proof of
//! possession shapes and the nonce endpoint response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jose::jwk::PublicKeyJwk;

/// `CredentialRequest` is used by the Wallet to request issuance from the
/// Credential Endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Identifies the credential requested for issuance, as a key into the
    /// issuer's `credential_configurations_supported` metadata.
    pub credential_configuration_id: String,

    /// Wallet's proof of possession of the cryptographic key material the
    /// issued credential will be bound to. REQUIRED when the requested
    /// configuration declares `proof_types_supported`.
    #[serde(flatten)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,

    /// When present, specifies how the Credential Response should be
    /// encrypted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_response_encryption: Option<CredentialResponseEncryption>,
}

/// Wallet's proof of possession of the key material the issued credential is
/// to be bound to: exactly one of `proof` (single) or `proofs` (batch).
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub enum Proof {
    /// A single proof of possession.
    #[serde(rename = "proof")]
    Single {
        /// The proof type used by the wallet.
        #[serde(flatten)]
        proof_type: SingleProof,
    },

    /// One proof of possession per credential instance requested.
    #[serde(rename = "proofs")]
    Multiple(MultipleProofs),
}

impl Default for Proof {
    fn default() -> Self {
        Self::Single {
            proof_type: SingleProof::default(),
        }
    }
}

/// A single proof of possession of cryptographic key material.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(tag = "proof_type")]
pub enum SingleProof {
    /// A JWT containing the Wallet's proof of possession of key material.
    #[serde(rename = "jwt")]
    Jwt {
        /// The compact-serialized proof JWT.
        jwt: String,
    },
}

impl Default for SingleProof {
    fn default() -> Self {
        Self::Jwt { jwt: String::new() }
    }
}

/// A batch of proofs of possession, keyed by proof type.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub enum MultipleProofs {
    /// JWTs containing the Wallet's proofs of possession of key material.
    #[serde(rename = "jwt")]
    Jwt(Vec<String>),
}

impl Default for MultipleProofs {
    fn default() -> Self {
        Self::Jwt(vec![])
    }
}

/// Claims of a proof-of-possession JWT binding an issued credential to the
/// Wallet's key material.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProofClaims {
    /// The `client_id` of the Client making the Credential request. Omitted
    /// in the anonymous pre-authorized flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// The Credential Issuer Identifier.
    pub aud: String,

    /// The time at which the proof was issued, as
    /// [RFC7519](https://www.rfc-editor.org/rfc/rfc7519) `NumericDate`.
    pub iat: i64,

    /// A server-provided `c_nonce`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Encryption parameters the Wallet sends when it wants (or the issuer
/// requires) an encrypted Credential Response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialResponseEncryption {
    /// The public key the issuer should encrypt the Credential Response to.
    pub jwk: PublicKeyJwk,

    /// JWE [RFC7516] `alg` for encrypting the Credential Response.
    ///
    /// [RFC7516]: (https://www.rfc-editor.org/rfc/rfc7516)
    pub alg: String,

    /// JWE [RFC7516] `enc` for encrypting the Credential Response.
    ///
    /// [RFC7516]: (https://www.rfc-editor.org/rfc/rfc7516)
    pub enc: String,
}

/// The Credential Response can be immediate or deferred. The Credential
/// Issuer may be able to immediately issue a requested credential, or may
/// instead return a `transaction_id` the Wallet redeems later at the
/// Deferred Credential Endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialResponse {
    /// Issued credential(s) or a deferred transaction id.
    #[serde(flatten)]
    pub kind: CredentialResponseKind,

    /// A nonce to be used in the proof of possession of the next credential
    /// request. When received, the Wallet MUST use this value until a fresh
    /// one is provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,

    /// The lifetime in seconds of the `c_nonce` parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<i64>,

    /// Identifies the issued credential(s) in subsequent calls to the
    /// issuer's Notification Endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
}

/// Body of a successful (or deferred) Credential Response.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialResponseKind {
    /// A single issued credential.
    Credential(Value),

    /// One or more issued credentials.
    Credentials(Vec<IssuedCredential>),

    /// Identifies a deferred issuance transaction. Returned when the issuer
    /// cannot immediately issue the credential; subsequently used at the
    /// Deferred Credential Endpoint.
    TransactionId(String),
}

impl Default for CredentialResponseKind {
    fn default() -> Self {
        Self::TransactionId(String::new())
    }
}

/// A single entry in the `credentials` array of a Credential Response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuedCredential {
    /// The issued credential. May be a string or an object, depending on the
    /// credential format.
    pub credential: Value,
}

/// Response from the Nonce Endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NonceResponse {
    /// A nonce to bind into the proof of possession of a credential request.
    pub c_nonce: String,

    /// The lifetime in seconds of the `c_nonce`. Absent when the issuer did
    /// not state one; never defaulted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<i64>,
}
