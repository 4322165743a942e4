//! OAuth 2.0 Authorization Server metadata (RFC 8414), as discovered through
//! OIDC discovery or the OAuth 2.0 well-known endpoint.

use serde::{Deserialize, Serialize};

/// OAuth 2.0 Authorization Server metadata.
/// See RFC 8414 - Authorization Server Metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthServerMetadata {
    /// The authorization server's issuer identifier (URL).
    pub issuer: String,

    /// URL of the authorization server's authorization endpoint.
    pub authorization_endpoint: String,

    /// URL of the authorization server's token endpoint.
    pub token_endpoint: String,

    /// URL of the authorization server's JWK Set document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// URL of the pushed authorization request endpoint (RFC 9126). If
    /// omitted, the server does not support PAR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushed_authorization_request_endpoint: Option<String>,

    /// Indicates whether the server only accepts authorization requests via
    /// PAR. Defaults to false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_pushed_authorization_requests: Option<bool>,

    /// URL of the token introspection endpoint (RFC 7662).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<String>,

    /// List of scope values the authorization server supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes_supported: Option<Vec<String>>,

    /// List of `response_type` values the authorization server supports.
    pub response_types_supported: Vec<String>,

    /// A list of grant types supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_types_supported: Option<Vec<String>>,

    /// Client authentication methods supported by the token endpoint,
    /// including `attest_jwt_client_auth` for Attestation-Based Client
    /// Authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_methods_supported: Option<Vec<String>>,

    /// PKCE code challenge methods supported (RFC 7636).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_methods_supported: Option<Vec<String>>,

    /// JWS algorithms supported for DPoP proofs (RFC 9449). If omitted, the
    /// server does not support DPoP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpop_signing_alg_values_supported: Option<Vec<String>>,

    /// Indicates whether the server accepts a Token Request with a
    /// Pre-Authorized Code but without a client id. Defaults to false.
    #[serde(rename = "pre-authorized_grant_anonymous_access_supported")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_authorized_grant_anonymous_access_supported: Option<bool>,
}

impl AuthServerMetadata {
    /// `true` when the server advertises support for Attestation-Based
    /// Client Authentication.
    #[must_use]
    pub fn supports_attested_auth(&self) -> bool {
        self.token_endpoint_auth_methods_supported
            .as_ref()
            .is_some_and(|methods| methods.iter().any(|m| m == "attest_jwt_client_auth"))
    }
}
