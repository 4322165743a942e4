//! Credential Offer types, as received from an issuer by value, by
//! reference, or as an `openid-credential-offer://` deep link.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the wallet received a credential offer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialOfferRequest {
    /// The offer object itself, as a raw JSON string.
    ByValue(String),

    /// A URL the offer object can be retrieved from.
    ByReference(String),
}

impl CredentialOfferRequest {
    /// Parse an offer from a deep-link URI of the form
    /// `openid-credential-offer://?credential_offer=…` or
    /// `…?credential_offer_uri=…`.
    ///
    /// Any scheme is accepted; only the query matters.
    ///
    /// # Errors
    ///
    /// Returns `Error::Offer` when neither parameter is present or the
    /// parameter value cannot be percent-decoded.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let Some((_, query)) = uri.split_once('?') else {
            return Err(Error::Offer(format!("offer URI has no query: {uri}")));
        };
        for param in query.split('&') {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let decoded = urlencoding::decode(value)
                .map_err(|e| Error::Offer(format!("issue decoding offer parameter: {e}")))?;
            match key {
                "credential_offer" => return Ok(Self::ByValue(decoded.into_owned())),
                "credential_offer_uri" => return Ok(Self::ByReference(decoded.into_owned())),
                _ => {}
            }
        }
        Err(Error::Offer(
            "offer URI contains neither credential_offer nor credential_offer_uri".into(),
        ))
    }
}

/// A Credential Offer object sent to the Wallet by a Credential Issuer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialOffer {
    /// The URL of the Credential Issuer the Wallet is requested to obtain
    /// one or more Credentials from.
    pub credential_issuer: String,

    /// Keys into the issuer's `credential_configurations_supported` metadata
    /// identifying the credentials on offer.
    pub credential_configuration_ids: Vec<String>,

    /// Grant Types the Credential Issuer is prepared to process for this
    /// offer. If absent, the Wallet must determine usable grants from the
    /// authorization server metadata. When multiple grants are present it is
    /// at the Wallet's discretion which one to use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grants: Option<Grants>,
}

impl CredentialOffer {
    /// Convenience method for extracting a pre-authorized code grant from an
    /// offer if it exists.
    #[must_use]
    pub fn pre_authorized_code(&self) -> Option<PreAuthorizedCodeGrant> {
        self.grants.as_ref().and_then(|grants| grants.pre_authorized_code.clone())
    }

    /// Convenience method for extracting an authorization code grant from an
    /// offer if it exists.
    #[must_use]
    pub fn authorization_code(&self) -> Option<AuthorizationCodeGrant> {
        self.grants.as_ref().and_then(|grants| grants.authorization_code.clone())
    }
}

/// Grant Types the Credential Issuer's Authorization Server is prepared to
/// process for a credential offer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Grants {
    /// Authorization Code Grant Type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<AuthorizationCodeGrant>,

    /// Pre-Authorized Code Grant Type.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_authorized_code: Option<PreAuthorizedCodeGrant>,
}

/// The Authorization Code Grant Type parameters.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationCodeGrant {
    /// Issuer state to bind the subsequent Authorization Request to this
    /// offer. MUST be echoed in the Authorization Request when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_state: Option<String>,

    /// The authorization server to use for this grant, when the issuer
    /// advertises more than one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_server: Option<String>,
}

/// The Pre-Authorized Code Grant Type parameters.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PreAuthorizedCodeGrant {
    /// The code representing the Credential Issuer's authorization for the
    /// Wallet to obtain the offered Credentials. Single-use.
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,

    /// When present, the Wallet must prompt the End-User for a Transaction
    /// Code delivered to them out of band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<TxCode>,

    /// The authorization server to use for this grant, when the issuer
    /// advertises more than one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_server: Option<String>,
}

/// Expected shape of the Transaction Code the End-User will be asked for.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TxCode {
    /// Input character set: "numeric" (default) or "text".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_mode: Option<String>,

    /// Expected code length, to help the Wallet render an input form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,

    /// Guidance for the End-User on where to find the code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TxCode {
    /// Check a user-supplied code against the advertised shape.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the code length or character set
    /// does not match.
    pub fn validate(&self, code: &str) -> Result<()> {
        if let Some(length) = self.length {
            if code.chars().count() as i64 != length {
                return Err(Error::Validation(format!(
                    "transaction code must be {length} characters"
                )));
            }
        }
        if self.input_mode.as_deref().unwrap_or("numeric") == "numeric"
            && !code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(Error::Validation("transaction code must be numeric".into()));
        }
        Ok(())
    }
}
