//! # Credential Offer Resolution
//!
//! Turns a received credential offer (by value, by reference, or as a deep
//! link) into a fully resolved, validated offer carrying the issuer and
//! authorization server metadata the rest of the flow needs.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::{FormatProfile, FormatRegistry};
use crate::metadata::{self, SignedMetadataPolicy};
use crate::provider::HttpClient;
use crate::types::{
    AuthServerMetadata, CredentialIssuerId, CredentialOffer, CredentialOfferRequest, Grants,
    IssuerMetadata,
};

/// A credential on offer, typed by how it will be authorized: through an
/// OAuth scope the issuer maps to the configuration, or through the
/// configuration's format profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OfferedCredential {
    /// The issuer exposes a scope for this configuration.
    ByScope {
        /// Key into `credential_configurations_supported`.
        configuration_id: String,

        /// The scope value the authorization server maps to the credential.
        scope: String,
    },

    /// No scope is exposed; the credential is identified by its format
    /// profile.
    ByProfile {
        /// Key into `credential_configurations_supported`.
        configuration_id: String,

        /// The configuration's format profile.
        profile: FormatProfile,
    },
}

impl OfferedCredential {
    /// The credential configuration identifier.
    #[must_use]
    pub fn configuration_id(&self) -> &str {
        match self {
            Self::ByScope { configuration_id, .. } | Self::ByProfile { configuration_id, .. } => {
                configuration_id
            }
        }
    }
}

/// A credential offer with its referenced metadata resolved and validated.
#[derive(Clone, Debug)]
pub struct ResolvedOffer {
    /// The offering issuer's identifier.
    pub credential_issuer: CredentialIssuerId,

    /// The issuer's metadata.
    pub issuer_metadata: IssuerMetadata,

    /// Metadata of the authorization server protecting the issuer.
    pub authorization_server: AuthServerMetadata,

    /// The credentials on offer, in offer order.
    pub offered: Vec<OfferedCredential>,

    /// Grants the issuer is prepared to process, as received.
    pub grants: Option<Grants>,
}

/// Resolve a credential offer request into a [`ResolvedOffer`].
///
/// The offer's `credential_issuer` is validated, issuer metadata is
/// resolved under the supplied policy, the authorization server is taken
/// from the authorization-code grant when it names one (falling back to the
/// first issuer-advertised server), and every offered configuration id is
/// checked against the issuer's supported set.
///
/// # Errors
///
/// Returns `Error::Offer` for unparseable offers or unknown configuration
/// ids, and propagates metadata resolution failures.
pub async fn resolve(
    http: &impl HttpClient, request: &CredentialOfferRequest, policy: &SignedMetadataPolicy,
    registry: &FormatRegistry,
) -> Result<ResolvedOffer> {
    tracing::debug!("offer::resolve");

    let offer = match request {
        CredentialOfferRequest::ByValue(raw) => serde_json::from_str::<CredentialOffer>(raw)
            .map_err(|e| Error::Offer(format!("issue parsing offer: {e}")))?,
        CredentialOfferRequest::ByReference(url) => {
            let response = http.get(url).await?;
            if !response.is_success() {
                return Err(Error::Offer(format!(
                    "offer request returned {}",
                    response.status
                )));
            }
            response
                .json::<CredentialOffer>()
                .map_err(|e| Error::Offer(format!("issue parsing referenced offer: {e}")))?
        }
    };

    if offer.credential_configuration_ids.is_empty() {
        return Err(Error::Offer("offer contains no credential configurations".into()));
    }

    let credential_issuer: CredentialIssuerId = offer.credential_issuer.parse()?;
    let issuer_metadata = metadata::issuer_metadata(http, &credential_issuer, policy).await?;

    // the grant may pin one of the issuer's authorization servers
    let grant_server = offer.grants.as_ref().and_then(|grants| {
        grants
            .authorization_code
            .as_ref()
            .and_then(|grant| grant.authorization_server.clone())
            .or_else(|| {
                grants
                    .pre_authorized_code
                    .as_ref()
                    .and_then(|grant| grant.authorization_server.clone())
            })
    });
    let server_url = match grant_server {
        Some(server) => {
            if let Some(advertised) = &issuer_metadata.authorization_servers {
                if !advertised.contains(&server) {
                    return Err(Error::Offer(format!(
                        "offer names authorization server {server} the issuer does not advertise"
                    )));
                }
            }
            server
        }
        None => issuer_metadata
            .authorization_servers
            .as_ref()
            .and_then(|servers| servers.first().cloned())
            .unwrap_or_else(|| credential_issuer.to_string()),
    };
    let authorization_server = metadata::auth_server_metadata(http, &server_url).await?;

    let mut offered = Vec::with_capacity(offer.credential_configuration_ids.len());
    for configuration_id in &offer.credential_configuration_ids {
        let Some(config) =
            issuer_metadata.credential_configurations_supported.get(configuration_id)
        else {
            return Err(Error::Offer(format!(
                "offered configuration {configuration_id} is not supported by the issuer"
            )));
        };

        if let Some(scope) = &config.scope {
            offered.push(OfferedCredential::ByScope {
                configuration_id: configuration_id.clone(),
                scope: scope.clone(),
            });
        } else {
            // re-run the profile through the registry so registered codecs
            // get to validate, and unknown formats stay opaque
            let value = serde_json::to_value(&config.profile)
                .map_err(|e| Error::Offer(format!("issue encoding profile: {e}")))?;
            let profile = decode_profile(registry, &value)?;
            offered.push(OfferedCredential::ByProfile {
                configuration_id: configuration_id.clone(),
                profile,
            });
        }
    }

    Ok(ResolvedOffer {
        credential_issuer,
        issuer_metadata,
        authorization_server,
        offered,
        grants: offer.grants,
    })
}

fn decode_profile(registry: &FormatRegistry, value: &Value) -> Result<FormatProfile> {
    registry.decode(value).map_err(|e| Error::Offer(format!("issue decoding profile: {e}")))
}
