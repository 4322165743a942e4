//! Authorization request details: `authorization_details` entries and the
//! pushed authorization request (PAR) response.

use serde::{Deserialize, Serialize};

/// Authorization Details entry used to convey the credential configuration
/// the Wallet wants authorization for (RFC 9396).
///
/// Only the `credential_configuration_id` shape is produced; format
/// specializations are not.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationDetail {
    /// Must be `openid_credential`.
    #[serde(rename = "type")]
    pub type_: AuthorizationDetailType,

    /// Identifies a credential in the issuer's
    /// `credential_configurations_supported` metadata.
    pub credential_configuration_id: String,
}

impl AuthorizationDetail {
    /// An `openid_credential` detail for the given configuration id.
    #[must_use]
    pub fn for_configuration(configuration_id: impl Into<String>) -> Self {
        Self {
            type_: AuthorizationDetailType::OpenIdCredential,
            credential_configuration_id: configuration_id.into(),
        }
    }
}

/// Authorization Details type identifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum AuthorizationDetailType {
    /// OpenID Credential authorization detail.
    #[default]
    #[serde(rename = "openid_credential")]
    OpenIdCredential,
}

/// Response to a pushed authorization request (RFC 9126).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ParResponse {
    /// Reference to the pushed request, for use as the `request_uri`
    /// authorization request parameter.
    pub request_uri: String,

    /// Lifetime in seconds of the `request_uri`.
    pub expires_in: i64,
}
