//! # JSON Web Signature (JWS)
//!
//! JWS ([RFC7515]) represents content secured with digital signatures using
//! JSON-based data structures. Signing is always delegated to the pluggable
//! [`Signer`] so private keys never enter this crate; verification is
//! implemented here for the algorithms the issuance profile uses (`ES256`,
//! `EdDSA`).
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515

use std::fmt::{self, Display};

use anyhow::{anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jose::jwk::{Curve, PublicKeyJwk};
use crate::provider::Signer;

/// Signing algorithms supported for proof and metadata JWTs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum Algorithm {
    /// ECDSA using P-256 and SHA-256.
    #[serde(rename = "ES256")]
    Es256,

    /// Edwards-curve digital signature (Ed25519).
    #[default]
    #[serde(rename = "EdDSA")]
    EdDsa,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Es256 => write!(f, "ES256"),
            Self::EdDsa => write!(f, "EdDSA"),
        }
    }
}

impl Algorithm {
    /// Parse an IANA JOSE algorithm name.
    ///
    /// # Errors
    ///
    /// Returns an error for algorithms outside the issuance profile.
    pub fn from_name(name: &str) -> anyhow::Result<Self> {
        match name {
            "ES256" => Ok(Self::Es256),
            "EdDSA" => Ok(Self::EdDsa),
            _ => Err(anyhow!("unsupported algorithm: {name}")),
        }
    }
}

/// The `typ` header parameter of the JWTs this crate constructs.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub enum JwtType {
    /// Proof of possession of key material for a credential request.
    #[serde(rename = "openid4vci-proof+jwt")]
    ProofJwt,

    /// DPoP proof (RFC 9449).
    #[serde(rename = "dpop+jwt")]
    DpopJwt,

    /// Client attestation proof of possession.
    #[serde(rename = "oauth-client-attestation-pop+jwt")]
    ClientAttestationPopJwt,
}

/// The key material a signature can be verified with: an embedded public key
/// or a key identifier the recipient can resolve.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyBinding {
    /// Embedded public key.
    #[serde(rename = "jwk")]
    Jwk(PublicKeyJwk),

    /// Key identifier (e.g. a DID URL).
    #[serde(rename = "kid")]
    Kid(String),
}

/// Protected header for the JWTs this crate constructs.
#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
pub struct Header {
    /// Signing algorithm.
    pub alg: Algorithm,

    /// Token type.
    pub typ: JwtType,

    /// Verification key material.
    #[serde(flatten)]
    pub key: KeyBinding,
}

/// Encode the provided claims and sign, returning a JWT in compact JWS form.
///
/// # Errors
///
/// Returns an error when the claims cannot be serialized or the signer fails.
pub async fn encode<T>(typ: JwtType, claims: &T, signer: &impl Signer) -> anyhow::Result<String>
where
    T: Serialize + Send + Sync,
{
    let header = Header {
        alg: signer.algorithm(),
        typ,
        key: signer.key_binding(),
    };

    let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
    let claims = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
    let payload = format!("{header}.{claims}");

    let sig = signer.try_sign(payload.as_bytes()).await?;
    let sig_enc = Base64UrlUnpadded::encode_string(&sig);

    Ok(format!("{payload}.{sig_enc}"))
}

/// The pieces of a compact JWS, decoded but not verified.
#[derive(Clone, Debug)]
pub struct JwsParts {
    /// Deserialized protected header.
    pub header: Value,

    /// Deserialized claims set.
    pub claims: Value,

    /// The signing input (`<header b64>.<claims b64>`).
    pub signing_input: String,

    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

/// Split a compact JWS into its parts without verifying the signature.
///
/// # Errors
///
/// Returns an error when the token is not three base64url segments of JSON.
pub fn decode_parts(token: &str) -> anyhow::Result<JwsParts> {
    let parts = token.split('.').collect::<Vec<&str>>();
    if parts.len() != 3 {
        bail!("invalid Compact JWS format");
    }

    let decoded = Base64UrlUnpadded::decode_vec(parts[0])
        .map_err(|e| anyhow!("issue decoding header: {e}"))?;
    let header: Value =
        serde_json::from_slice(&decoded).map_err(|e| anyhow!("issue deserializing header: {e}"))?;
    let decoded = Base64UrlUnpadded::decode_vec(parts[1])
        .map_err(|e| anyhow!("issue decoding claims: {e}"))?;
    let claims: Value =
        serde_json::from_slice(&decoded).map_err(|e| anyhow!("issue deserializing claims: {e}"))?;
    let signature = Base64UrlUnpadded::decode_vec(parts[2])
        .map_err(|e| anyhow!("issue decoding signature: {e}"))?;

    Ok(JwsParts {
        header,
        claims,
        signing_input: format!("{}.{}", parts[0], parts[1]),
        signature,
    })
}

/// Verify the signature of the provided message using the JWK.
///
/// # Errors
///
/// Returns an error if the signature is invalid, the JWK is invalid, or the
/// algorithm does not match the key's curve.
pub fn verify(jwk: &PublicKeyJwk, alg: Algorithm, msg: &str, sig: &[u8]) -> anyhow::Result<()> {
    match (jwk.crv.clone(), alg) {
        (Curve::P256, Algorithm::Es256) => verify_es256(jwk, msg, sig),
        (Curve::Ed25519, Algorithm::EdDsa) => verify_eddsa(jwk, msg, sig),
        (crv, alg) => Err(anyhow!("algorithm {alg} does not match key curve {crv:?}")),
    }
}

// Verify the signature of the provided message using the ES256 algorithm.
fn verify_es256(jwk: &PublicKeyJwk, msg: &str, sig: &[u8]) -> anyhow::Result<()> {
    use p256::ecdsa::signature::Verifier as _;
    use p256::ecdsa::{Signature, VerifyingKey};

    // build verifying key
    let y = jwk.y.as_ref().ok_or_else(|| anyhow!("JWK 'y' is missing"))?;
    let mut sec1 = vec![0x04]; // uncompressed format
    sec1.append(&mut Base64UrlUnpadded::decode_vec(&jwk.x)?);
    sec1.append(&mut Base64UrlUnpadded::decode_vec(y)?);

    let verifying_key = VerifyingKey::from_sec1_bytes(&sec1)?;
    let signature: Signature = Signature::from_slice(sig)?;

    Ok(verifying_key.verify(msg.as_bytes(), &signature)?)
}

// Verify the signature of the provided message using the EdDSA algorithm.
fn verify_eddsa(jwk: &PublicKeyJwk, msg: &str, sig_bytes: &[u8]) -> anyhow::Result<()> {
    use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};

    // build verifying key
    let x_bytes = Base64UrlUnpadded::decode_vec(&jwk.x)
        .map_err(|e| anyhow!("unable to base64 decode JWK 'x': {e}"))?;
    let bytes = &x_bytes.try_into().map_err(|_| anyhow!("invalid public key length"))?;
    let verifying_key = VerifyingKey::from_bytes(bytes)
        .map_err(|e| anyhow!("unable to build verifying key: {e}"))?;
    let signature =
        Signature::from_slice(sig_bytes).map_err(|e| anyhow!("unable to build signature: {e}"))?;

    verifying_key
        .verify(msg.as_bytes(), &signature)
        .map_err(|e| anyhow!("unable to verify signature: {e}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::jose::jwk::KeyType;

    #[test]
    fn header_embeds_jwk() {
        let header = Header {
            alg: Algorithm::Es256,
            typ: JwtType::DpopJwt,
            key: KeyBinding::Jwk(PublicKeyJwk {
                kty: KeyType::Ec,
                crv: Curve::P256,
                x: "x".into(),
                y: Some("y".into()),
                ..PublicKeyJwk::default()
            }),
        };
        let ser = serde_json::to_value(&header).expect("should serialize");
        assert_eq!(
            ser,
            json!({
                "alg": "ES256",
                "typ": "dpop+jwt",
                "jwk": {"kty": "EC", "crv": "P-256", "x": "x", "y": "y"}
            })
        );
    }

    #[test]
    fn header_kid() {
        let header = Header {
            alg: Algorithm::EdDsa,
            typ: JwtType::ProofJwt,
            key: KeyBinding::Kid("did:example:holder#key-1".into()),
        };
        let ser = serde_json::to_value(&header).expect("should serialize");
        assert_eq!(
            ser,
            json!({
                "alg": "EdDSA",
                "typ": "openid4vci-proof+jwt",
                "kid": "did:example:holder#key-1"
            })
        );
    }

    #[test]
    fn decode_rejects_malformed() {
        assert!(decode_parts("one.two").is_err());
        assert!(decode_parts("!!.!!.!!").is_err());
    }
}
