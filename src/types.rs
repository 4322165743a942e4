//! # Wire Types
//!
//! Request and response types for the OpenID4VCI and OAuth 2.0 endpoints the
//! wallet talks to, plus the validated identifiers shared across them.

mod authorization;
mod credential;
mod metadata;
mod notification;
mod oauth;
mod offer;
mod token;

use std::fmt::{self, Display};
use std::str::FromStr;

pub use authorization::{
    AuthorizationDetail, AuthorizationDetailType, ParResponse,
};
pub use credential::{
    CredentialRequest, CredentialResponse, CredentialResponseEncryption, CredentialResponseKind,
    IssuedCredential, MultipleProofs, NonceResponse, Proof, ProofClaims, SingleProof,
};
pub use metadata::{
    BatchCredentialIssuance, ClaimsDescription, CredentialConfiguration, CredentialDisplay,
    Display as LocalizedDisplay, Image, IssuerMetadata, ProofTypesSupported,
    SupportedResponseEncryption,
};
pub use notification::{
    DeferredCredentialRequest, NotificationEvent, NotificationRequest,
};
pub use oauth::AuthServerMetadata;
pub use offer::{
    AuthorizationCodeGrant, CredentialOffer, CredentialOfferRequest, Grants,
    PreAuthorizedCodeGrant, TxCode,
};
pub use token::{TokenGrantType, TokenRequest, TokenResponse, TokenType};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The identifier of a credential issuer: an absolute HTTPS URL with no
/// query, no fragment, and no trailing slash.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialIssuerId(String);

impl CredentialIssuerId {
    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CredentialIssuerId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let Some(rest) = value.strip_prefix("https://") else {
            return Err(Error::Validation(format!("issuer identifier must use https: {value}")));
        };
        if rest.is_empty() || rest.starts_with('/') {
            return Err(Error::Validation(format!("issuer identifier has no host: {value}")));
        }
        if value.contains('?') {
            return Err(Error::Validation(format!(
                "issuer identifier must not contain a query: {value}"
            )));
        }
        if value.contains('#') {
            return Err(Error::Validation(format!(
                "issuer identifier must not contain a fragment: {value}"
            )));
        }
        if value.ends_with('/') {
            return Err(Error::Validation(format!(
                "issuer identifier must not end with '/': {value}"
            )));
        }
        Ok(Self(value))
    }
}

impl FromStr for CredentialIssuerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<CredentialIssuerId> for String {
    fn from(id: CredentialIssuerId) -> Self {
        id.0
    }
}

impl Display for CredentialIssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
