//! # Metadata Resolvers
//!
//! Resolution of Credential Issuer metadata (unsigned or signed) and OAuth
//! 2.0 Authorization Server metadata. Both resolvers are pure over their
//! inputs: no caching happens here.

use chrono::Utc;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::jose::jwk::JwkSet;
use crate::jose::jws::{self, Algorithm};
use crate::provider::HttpClient;
use crate::types::{AuthServerMetadata, CredentialIssuerId, IssuerMetadata};

/// How signed issuer metadata (`signed_metadata` JWT) is treated.
#[derive(Clone, Debug)]
pub enum SignedMetadataPolicy {
    /// Use the unsigned JSON document as-is, ignoring any signature.
    IgnoreSigned,

    /// Require a `signed_metadata` JWT and verify it against the trust
    /// source; resolution fails without one.
    RequireSigned(TrustSource),

    /// Verify `signed_metadata` when present, fall back to the unsigned
    /// document when it is not.
    PreferSigned(TrustSource),
}

impl Default for SignedMetadataPolicy {
    fn default() -> Self {
        Self::IgnoreSigned
    }
}

/// Where the keys to verify signed metadata come from.
#[derive(Clone, Debug)]
pub enum TrustSource {
    /// Keys pinned by the wallet's deployment.
    PinnedJwks(JwkSet),

    /// A JWKS document to fetch.
    JwksUrl(String),
}

/// Resolve Credential Issuer metadata from the well-known endpoint,
/// applying the signed-metadata policy.
///
/// # Errors
///
/// Returns `Error::Metadata` when discovery fails, required fields are
/// missing, or signed metadata cannot be verified.
pub async fn issuer_metadata(
    http: &impl HttpClient, issuer: &CredentialIssuerId, policy: &SignedMetadataPolicy,
) -> Result<IssuerMetadata> {
    tracing::debug!("metadata::issuer_metadata");

    let url = format!("{issuer}/.well-known/openid-credential-issuer");
    let response = http.get(&url).await?;
    if !response.is_success() {
        return Err(Error::Metadata(format!(
            "issuer metadata request returned {}",
            response.status
        )));
    }
    let unsigned: Value = response.json()?;

    let signed_jwt = unsigned.get("signed_metadata").and_then(Value::as_str);
    let document = match (policy, signed_jwt) {
        (SignedMetadataPolicy::IgnoreSigned, _) | (SignedMetadataPolicy::PreferSigned(_), None) => {
            unsigned.clone()
        }
        (SignedMetadataPolicy::RequireSigned(_), None) => {
            return Err(Error::Metadata("issuer metadata is not signed".into()));
        }
        (
            SignedMetadataPolicy::RequireSigned(trust) | SignedMetadataPolicy::PreferSigned(trust),
            Some(jwt),
        ) => merge_signed(http, issuer, &unsigned, jwt, trust).await?,
    };

    let metadata: IssuerMetadata = serde_json::from_value(document)
        .map_err(|e| Error::Metadata(format!("issue deserializing issuer metadata: {e}")))?;
    if metadata.credential_issuer != issuer.as_str() {
        return Err(Error::Metadata(format!(
            "metadata credential_issuer {} does not match {issuer}",
            metadata.credential_issuer
        )));
    }
    if metadata.credential_endpoint.is_empty() {
        return Err(Error::Metadata("issuer metadata has no credential endpoint".into()));
    }

    Ok(metadata)
}

// Verify the signed metadata JWT and merge its claims over the unsigned
// document, signed claims winning.
async fn merge_signed(
    http: &impl HttpClient, issuer: &CredentialIssuerId, unsigned: &Value, jwt: &str,
    trust: &TrustSource,
) -> Result<Value> {
    let parts = jws::decode_parts(jwt)
        .map_err(|e| Error::Metadata(format!("issue decoding signed metadata: {e}")))?;

    // claims checks happen before any signature work so a mismatched issuer
    // fails without fetching trust keys
    if parts.claims.get("iss").and_then(Value::as_str) != Some(issuer.as_str()) {
        return Err(Error::Metadata("signed metadata iss does not match issuer".into()));
    }
    if parts.claims.get("sub").and_then(Value::as_str) != Some(issuer.as_str()) {
        return Err(Error::Metadata("signed metadata sub does not match issuer".into()));
    }
    if parts.claims.get("iat").and_then(Value::as_i64).is_none() {
        return Err(Error::Metadata("signed metadata has no iat claim".into()));
    }
    if let Some(exp) = parts.claims.get("exp").and_then(Value::as_i64) {
        if exp <= Utc::now().timestamp() {
            return Err(Error::Metadata("signed metadata has expired".into()));
        }
    }

    let alg = parts
        .header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Metadata("signed metadata header has no alg".into()))?;
    let alg = Algorithm::from_name(alg).map_err(|e| Error::Metadata(e.to_string()))?;

    let keys = match trust {
        TrustSource::PinnedJwks(jwks) => jwks.clone(),
        TrustSource::JwksUrl(url) => {
            let response = http.get(url).await?;
            if !response.is_success() {
                return Err(Error::Metadata(format!(
                    "trust JWKS request returned {}",
                    response.status
                )));
            }
            response.json()?
        }
    };
    let kid = parts.header.get("kid").and_then(Value::as_str);
    let key = keys
        .select(kid)
        .ok_or_else(|| Error::Metadata("no trust key matches signed metadata".into()))?;

    jws::verify(key, alg, &parts.signing_input, &parts.signature)
        .map_err(|e| Error::Metadata(format!("signed metadata verification failed: {e}")))?;

    let Value::Object(mut merged) = unsigned.clone() else {
        return Err(Error::Metadata("issuer metadata is not a JSON object".into()));
    };
    let Value::Object(claims) = parts.claims else {
        return Err(Error::Metadata("signed metadata claims are not a JSON object".into()));
    };
    for (key, value) in claims {
        if matches!(key.as_str(), "iss" | "sub" | "iat" | "exp" | "nbf" | "aud" | "jti") {
            continue;
        }
        merged.insert(key, value);
    }
    Ok(Value::Object(merged))
}

/// Resolve Authorization Server metadata, probing OIDC discovery first and
/// falling back to OAuth 2.0 Authorization Server metadata (RFC 8414).
///
/// # Errors
///
/// Returns `Error::Metadata` when neither document can be retrieved or
/// required fields are missing from both.
pub async fn auth_server_metadata(
    http: &impl HttpClient, server: &str,
) -> Result<AuthServerMetadata> {
    tracing::debug!("metadata::auth_server_metadata");

    let server = server.trim_end_matches('/');

    let oidc = format!("{server}/.well-known/openid-configuration");
    if let Some(metadata) = probe(http, &oidc).await? {
        return Ok(metadata);
    }

    let oauth = format!("{server}/.well-known/oauth-authorization-server");
    match probe(http, &oauth).await? {
        Some(metadata) => Ok(metadata),
        None => Err(Error::Metadata(format!(
            "no usable authorization server metadata at {server}"
        ))),
    }
}

// Fetch one discovery document; `None` means "try the next location".
async fn probe(http: &impl HttpClient, url: &str) -> Result<Option<AuthServerMetadata>> {
    let response = http.get(url).await?;
    if !response.is_success() {
        return Ok(None);
    }
    let document: Value = response.json()?;

    const REQUIRED: [&str; 4] =
        ["issuer", "authorization_endpoint", "token_endpoint", "response_types_supported"];
    if REQUIRED.iter().any(|field| document.get(field).is_none()) {
        return Ok(None);
    }

    let metadata: AuthServerMetadata = serde_json::from_value(document)
        .map_err(|e| Error::Metadata(format!("issue deserializing server metadata: {e}")))?;
    Ok(Some(metadata))
}
