//! Token endpoint request and response types, as defined in [RFC6749] with
//! the OpenID4VCI pre-authorized code extension.
//!
//! [RFC6749]: (https://www.rfc-editor.org/rfc/rfc6749.html)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::authorization::AuthorizationDetail;

/// Upon receiving a successful Authorization Response (or holding a
/// pre-authorized code), a Token Request is made to the token endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenRequest {
    /// OAuth 2.0 Client ID used by the Wallet.
    ///
    /// REQUIRED if the client is not otherwise authenticating with the
    /// authorization server. For the Pre-Authorized Code Grant Type, client
    /// authentication is OPTIONAL and the parameter is only needed when a
    /// form of client authentication that relies on it is used.
    pub client_id: Option<String>,

    /// Authorization grant type.
    #[serde(flatten)]
    pub grant_type: TokenGrantType,

    /// Details about the credentials the Wallet wants to obtain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_details: Option<Vec<AuthorizationDetail>>,
}

impl TokenRequest {
    /// Create a `HashMap` representation of the `TokenRequest` suitable for
    /// use in an HTML form post.
    ///
    /// # Errors
    ///
    /// Returns an error if `authorization_details` cannot be serialized to
    /// JSON.
    pub fn form_encode(&self) -> Result<HashMap<String, String>> {
        let mut map = HashMap::new();
        if let Some(client_id) = &self.client_id {
            map.insert("client_id".to_string(), client_id.clone());
        }
        match &self.grant_type {
            TokenGrantType::AuthorizationCode {
                code,
                redirect_uri,
                code_verifier,
            } => {
                map.insert("grant_type".to_string(), "authorization_code".to_string());
                map.insert("code".to_string(), code.clone());
                if let Some(redirect_uri) = redirect_uri {
                    map.insert("redirect_uri".to_string(), redirect_uri.clone());
                }
                if let Some(code_verifier) = code_verifier {
                    map.insert("code_verifier".to_string(), code_verifier.clone());
                }
            }
            TokenGrantType::PreAuthorizedCode {
                pre_authorized_code,
                tx_code,
            } => {
                map.insert(
                    "grant_type".to_string(),
                    "urn:ietf:params:oauth:grant-type:pre-authorized_code".to_string(),
                );
                map.insert("pre-authorized_code".to_string(), pre_authorized_code.clone());
                if let Some(tx_code) = tx_code {
                    map.insert("tx_code".to_string(), tx_code.clone());
                }
            }
            TokenGrantType::RefreshToken { refresh_token } => {
                map.insert("grant_type".to_string(), "refresh_token".to_string());
                map.insert("refresh_token".to_string(), refresh_token.clone());
            }
        }
        if let Some(authorization_details) = &self.authorization_details {
            let as_json = serde_json::to_string(authorization_details)
                .map_err(|e| Error::Validation(format!("issue encoding details: {e}")))?;
            map.insert("authorization_details".to_string(), as_json);
        }
        Ok(map)
    }
}

/// Token authorization grant types.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "grant_type")]
pub enum TokenGrantType {
    /// Attributes required for the Authorization Code grant type.
    #[serde(rename = "authorization_code")]
    AuthorizationCode {
        /// The authorization code received from the authorization server.
        code: String,

        /// REQUIRED if the `redirect_uri` parameter was included in the
        /// authorization request; values MUST be identical.
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect_uri: Option<String>,

        /// PKCE code verifier. MUST verify against the `code_challenge`
        /// provided in the authorization request.
        #[serde(skip_serializing_if = "Option::is_none")]
        code_verifier: Option<String>,
    },

    /// Attributes required for the Pre-Authorized Code grant type.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    PreAuthorizedCode {
        /// The pre-authorized code provided to the Wallet in the Credential
        /// Offer.
        #[serde(rename = "pre-authorized_code")]
        pre_authorized_code: String,

        /// The Transaction Code provided to the End-User out of band. Must
        /// be present if `tx_code` was set in the Credential Offer.
        #[serde(skip_serializing_if = "Option::is_none")]
        tx_code: Option<String>,
    },

    /// Attributes required for the Refresh Token grant type.
    #[serde(rename = "refresh_token")]
    RefreshToken {
        /// The refresh token issued alongside a previous access token.
        refresh_token: String,
    },
}

impl Default for TokenGrantType {
    fn default() -> Self {
        Self::AuthorizationCode {
            code: String::new(),
            redirect_uri: None,
            code_verifier: None,
        }
    }
}

/// Token Response as defined in [RFC6749].
///
/// [RFC6749]: (https://www.rfc-editor.org/rfc/rfc6749.html)
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// An OAuth 2.0 Access Token that can subsequently be used to request
    /// one or more credentials.
    pub access_token: String,

    /// The type of the token issued: `Bearer`, or `DPoP` for a
    /// sender-constrained token (RFC 9449).
    pub token_type: TokenType,

    /// The lifetime in seconds of the access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Token that can be used to obtain a fresh access token without
    /// re-authorizing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// A nonce to bind into the proof of possession of key material in a
    /// subsequent Credential Request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,

    /// The lifetime in seconds of the `c_nonce` parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<i64>,

    /// Scope granted, when it differs from the scope requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Echoed authorization details. Identifier-based issuance is not
    /// supported by this crate, so the value is carried opaquely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_details: Option<serde_json::Value>,
}

/// Access token type.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenType {
    /// Plain bearer token.
    #[default]
    #[serde(rename = "Bearer", alias = "bearer", alias = "BEARER")]
    Bearer,

    /// DPoP sender-constrained token (RFC 9449).
    #[serde(rename = "DPoP", alias = "dpop", alias = "DPOP")]
    DPoP,
}

impl TokenType {
    /// The `Authorization` header scheme matching this token type.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Bearer => "Bearer",
            Self::DPoP => "DPoP",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pre_authorized_form_encoding() {
        let request = TokenRequest {
            client_id: Some("wallet-client".to_string()),
            grant_type: TokenGrantType::PreAuthorizedCode {
                pre_authorized_code: "WQHhDmQ3ZygxyOPlBjunlA".to_string(),
                tx_code: Some("111222".to_string()),
            },
            authorization_details: None,
        };

        let map = request.form_encode().expect("should encode");
        assert_eq!(
            map.get("grant_type").map(String::as_str),
            Some("urn:ietf:params:oauth:grant-type:pre-authorized_code")
        );
        assert_eq!(map.get("pre-authorized_code").map(String::as_str), Some("WQHhDmQ3ZygxyOPlBjunlA"));
        assert_eq!(map.get("tx_code").map(String::as_str), Some("111222"));
        assert!(!map.contains_key("code_verifier"));
    }

    #[test]
    fn authorization_code_form_encoding() {
        let request = TokenRequest {
            client_id: Some("wallet-client".to_string()),
            grant_type: TokenGrantType::AuthorizationCode {
                code: "SplxlOBeZQQYbYS6WxSbIA".to_string(),
                redirect_uri: Some("https://wallet.example/cb".to_string()),
                code_verifier: Some("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string()),
            },
            authorization_details: Some(vec![AuthorizationDetail::for_configuration(
                "eu.europa.ec.eudi.pid_mso_mdoc",
            )]),
        };

        let map = request.form_encode().expect("should encode");
        assert_eq!(map.get("grant_type").map(String::as_str), Some("authorization_code"));
        assert_eq!(
            map.get("code_verifier").map(String::as_str),
            Some("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")
        );
        let details: serde_json::Value =
            serde_json::from_str(map.get("authorization_details").expect("should be present"))
                .expect("should be JSON");
        assert_eq!(details[0]["type"], json!("openid_credential"));
    }

    #[test]
    fn token_type_accepts_lowercase() {
        let response: TokenResponse = serde_json::from_value(json!({
            "access_token": "token",
            "token_type": "bearer",
            "expires_in": 3600
        }))
        .expect("should deserialize");
        assert_eq!(response.token_type, TokenType::Bearer);

        let response: TokenResponse = serde_json::from_value(json!({
            "access_token": "token",
            "token_type": "DPoP"
        }))
        .expect("should deserialize");
        assert_eq!(response.token_type, TokenType::DPoP);
    }
}
