//! Credential Issuer metadata, retrieved from
//! `{issuer}/.well-known/openid-credential-issuer`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::format::FormatProfile;

/// The Credential Issuer's configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuerMetadata {
    /// The Credential Issuer's identifier.
    pub credential_issuer: String,

    /// Authorization Server identifiers (metadata `issuer` values). If
    /// omitted, the Credential Issuer is acting as its own Authorization
    /// Server and the `credential_issuer` value is used instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_servers: Option<Vec<String>>,

    /// URL of the Credential Issuer's Credential Endpoint.
    pub credential_endpoint: String,

    /// URL of the Credential Issuer's Nonce Endpoint. If omitted, the
    /// Credential Issuer does not support the Nonce Endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce_endpoint: Option<String>,

    /// URL of the Credential Issuer's Deferred Credential Endpoint. If
    /// omitted, the Credential Issuer does not support deferred issuance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deferred_credential_endpoint: Option<String>,

    /// URL of the Credential Issuer's Notification Endpoint. If omitted, the
    /// Credential Issuer does not accept notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_endpoint: Option<String>,

    /// Specifies whether (and how) the Credential Issuer supports encryption
    /// of the Credential Response on top of TLS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_response_encryption: Option<SupportedResponseEncryption>,

    /// Present when the issuer supports the `proofs` parameter in the
    /// Credential Request, i.e. can issue more than one credential instance
    /// for the same dataset in a single request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_credential_issuance: Option<BatchCredentialIssuance>,

    /// A signed JWT containing Credential Issuer metadata parameters as
    /// claims. When the Wallet supports signed metadata, values conveyed in
    /// the JWT take precedence over the plain JSON elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_metadata: Option<String>,

    /// Credential Issuer display properties for supported languages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Vec<Display>>,

    /// Credentials supported by the Credential Issuer, keyed by credential
    /// configuration identifier. The identifier is used in Credential Offers
    /// to communicate which credential is being offered.
    pub credential_configurations_supported: HashMap<String, CredentialConfiguration>,
}

impl IssuerMetadata {
    /// Convenience method to provide the issuer's display name for a locale,
    /// falling back to the first configured name.
    #[must_use]
    pub fn display_name(&self, locale: Option<&str>) -> Option<&str> {
        let display = self.display.as_ref()?;
        display
            .iter()
            .find(|d| d.locale.as_deref() == locale)
            .or_else(|| display.first())
            .map(|d| d.name.as_str())
    }
}

/// Contains information about whether the Credential Issuer supports
/// encryption of the Credential Response on top of TLS.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SupportedResponseEncryption {
    /// JWE [RFC7516] `alg` values the issuer accepts for encrypting
    /// Credential Responses.
    ///
    /// [RFC7516]: (https://www.rfc-editor.org/rfc/rfc7516)
    pub alg_values_supported: Vec<String>,

    /// JWE [RFC7516] `enc` values the issuer accepts for encrypting
    /// Credential Responses.
    ///
    /// [RFC7516]: (https://www.rfc-editor.org/rfc/rfc7516)
    pub enc_values_supported: Vec<String>,

    /// When true, the Credential Issuer requires encryption for every
    /// Credential Response and the Wallet MUST provide encryption keys in
    /// the Credential Request. When false, the Wallet MAY choose to.
    pub encryption_required: bool,
}

/// Issuer support for batch issuance on the Credential Endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BatchCredentialIssuance {
    /// The maximum array size for the `proofs` parameter in a Credential
    /// Request.
    pub batch_size: i64,
}

/// Language-based display properties.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Display {
    /// The name to use for the specified locale. If no locale is set, this
    /// is the default value.
    pub name: String,

    /// A BCP47 [RFC5646] language tag identifying the display language.
    ///
    /// [RFC5646]: (https://www.rfc-editor.org/rfc/rfc5646)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// A credential the issuer is able to issue: format profile plus issuance
/// constraints and display hints.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialConfiguration {
    /// The credential's format profile ("mso_mdoc", "dc+sd-jwt", …) with its
    /// format-specific parameters.
    #[serde(flatten)]
    pub profile: FormatProfile,

    /// The `scope` value the Authorization Server maps to this credential.
    /// The Wallet can use this value in Authorization Requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// How the issued credential may be bound to the End-User's key
    /// material, e.g. "jwk" or "cose_key".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptographic_binding_methods_supported: Option<Vec<String>>,

    /// Algorithms the issuer may sign the credential with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_signing_alg_values_supported: Option<Vec<String>>,

    /// The key proof types the Credential Issuer supports, keyed by proof
    /// type identifier (e.g. "jwt").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_types_supported: Option<HashMap<String, ProofTypesSupported>>,

    /// Language-based display properties of the supported credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Vec<CredentialDisplay>>,
}

/// Metadata about a key proof type the Credential Issuer supports.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProofTypesSupported {
    /// Algorithms the issuer accepts for this proof type. The Wallet signs
    /// the proof with one of them.
    pub proof_signing_alg_values_supported: Vec<String>,
}

/// Claims path pointer with optional issuance and display hints.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClaimsDescription {
    /// Path to a claim within the credential. For example,
    /// `["address", "street_address"]` points to the `street_address` claim
    /// within the `address` claim.
    pub path: Vec<String>,

    /// Whether the Credential Issuer will always include this claim in the
    /// issued credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,

    /// Display properties of the claim for specified languages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Vec<Display>>,
}

/// Language-based display properties of a supported credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialDisplay {
    /// The value to use when displaying the name of the credential for the
    /// specified locale.
    pub name: String,

    /// A BCP47 [RFC5646] language tag identifying the display language.
    ///
    /// [RFC5646]: (https://www.rfc-editor.org/rfc/rfc5646)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Information about the logo of the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Image>,

    /// Description of the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Background color of the credential, as CSS color value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    /// Information about the background image of the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<Image>,

    /// Text color of the credential, as CSS color value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// Information about a logo or background image.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Image {
    /// URL where the Wallet can obtain the image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Alternative text for the image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn issuer_metadata_deserializes() {
        let json = json!({
            "credential_issuer": "https://issuer.example",
            "credential_endpoint": "https://issuer.example/credential",
            "nonce_endpoint": "https://issuer.example/nonce",
            "credential_response_encryption": {
                "alg_values_supported": ["ECDH-ES"],
                "enc_values_supported": ["A256GCM"],
                "encryption_required": false
            },
            "display": [{"name": "Example Issuer", "locale": "en"}],
            "credential_configurations_supported": {
                "eu.europa.ec.eudi.pid_mso_mdoc": {
                    "format": "mso_mdoc",
                    "doctype": "eu.europa.ec.eudi.pid.1",
                    "scope": "eu.europa.ec.eudi.pid_mso_mdoc",
                    "proof_types_supported": {
                        "jwt": {"proof_signing_alg_values_supported": ["ES256"]}
                    }
                }
            }
        });

        let metadata: IssuerMetadata =
            serde_json::from_value(json).expect("should deserialize");
        assert_eq!(metadata.display_name(Some("en")), Some("Example Issuer"));

        let config = &metadata.credential_configurations_supported
            ["eu.europa.ec.eudi.pid_mso_mdoc"];
        assert_eq!(config.scope.as_deref(), Some("eu.europa.ec.eudi.pid_mso_mdoc"));
        assert_eq!(
            config.profile,
            FormatProfile::MsoMdoc {
                doctype: "eu.europa.ec.eudi.pid.1".into(),
                claims: None
            }
        );
    }
}
