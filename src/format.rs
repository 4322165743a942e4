//! # Credential Format Profiles
//!
//! The `OpenID4VCI` specification defines commonly used [Credential Format
//! Profiles]. Each profile defines format-specific parameters in credential
//! configurations and, optionally, format-specific members of the credential
//! request body.
//!
//! Profiles are an open extension point: built-in codecs cover `mso_mdoc`
//! and `dc+sd-jwt`, further formats can be registered in a
//! [`FormatRegistry`], and configurations in formats nobody registered
//! round-trip untouched as [`FormatProfile::Other`].
//!
//! [Credential Format Profiles]: (https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html#name-credential-format-profiles)

use std::collections::BTreeMap;

use anyhow::{anyhow, bail};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ClaimsDescription;

/// Format discriminator for ISO mDL credentials.
pub const MSO_MDOC: &str = "mso_mdoc";

/// Format discriminator for IETF SD-JWT VC credentials.
pub const DC_SD_JWT: &str = "dc+sd-jwt";

/// Format-specific parameters of a credential configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatProfile {
    /// ISO mDL.
    ///
    /// A Credential Format Profile for credentials complying with
    /// [ISO.18013-5] — the ISO-compliant driving licence specification.
    ///
    /// [ISO.18013-5]: (https://www.iso.org/standard/69084.html)
    MsoMdoc {
        /// The document type, as defined in [ISO.18013-5].
        ///
        /// [ISO.18013-5]: (https://www.iso.org/standard/69084.html)
        doctype: String,

        /// Claims the issuer supports for this document type.
        claims: Option<Vec<ClaimsDescription>>,
    },

    /// IETF SD-JWT VC.
    ///
    /// A Credential Format Profile for credentials complying with
    /// [I-D.ietf-oauth-sd-jwt-vc] — SD-JWT-based Verifiable Credentials for
    /// selective disclosure.
    ///
    /// [I-D.ietf-oauth-sd-jwt-vc]: (https://datatracker.ietf.org/doc/html/draft-ietf-oauth-sd-jwt-vc)
    DcSdJwt {
        /// Identifier for the type of the SD-JWT VC (`vct`).
        vct: String,

        /// Claims the issuer supports for this credential type.
        claims: Option<Vec<ClaimsDescription>>,
    },

    /// A format this crate has no codec for. The configuration content is
    /// preserved verbatim so unknown formats survive a round trip.
    Other(Value),
}

impl Default for FormatProfile {
    fn default() -> Self {
        Self::Other(Value::Object(Map::new()))
    }
}

impl FormatProfile {
    /// The format discriminator, when one is present.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        match self {
            Self::MsoMdoc { .. } => Some(MSO_MDOC),
            Self::DcSdJwt { .. } => Some(DC_SD_JWT),
            Self::Other(value) => value.get("format").and_then(Value::as_str),
        }
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let format = value.get("format").and_then(Value::as_str);
        match format {
            Some(MSO_MDOC) => {
                let Some(doctype) = value.get("doctype").and_then(Value::as_str) else {
                    return Err("mso_mdoc configuration is missing doctype".into());
                };
                let claims = match value.get("claims") {
                    Some(claims) => serde_json::from_value(claims.clone())
                        .map_err(|e| format!("issue deserializing mso_mdoc claims: {e}"))?,
                    None => None,
                };
                Ok(Self::MsoMdoc { doctype: doctype.to_string(), claims })
            }
            Some(DC_SD_JWT) => {
                let Some(vct) = value.get("vct").and_then(Value::as_str) else {
                    return Err("dc+sd-jwt configuration is missing vct".into());
                };
                let claims = match value.get("claims") {
                    Some(claims) => serde_json::from_value(claims.clone())
                        .map_err(|e| format!("issue deserializing dc+sd-jwt claims: {e}"))?,
                    None => None,
                };
                Ok(Self::DcSdJwt { vct: vct.to_string(), claims })
            }
            _ => Ok(Self::Other(value)),
        }
    }
}

impl Serialize for FormatProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::MsoMdoc { doctype, claims } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("format", MSO_MDOC)?;
                map.serialize_entry("doctype", doctype)?;
                if let Some(claims) = claims {
                    map.serialize_entry("claims", claims)?;
                }
                map.end()
            }
            Self::DcSdJwt { vct, claims } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("format", DC_SD_JWT)?;
                map.serialize_entry("vct", vct)?;
                if let Some(claims) = claims {
                    map.serialize_entry("claims", claims)?;
                }
                map.end()
            }
            Self::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FormatProfile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// A per-format codec: decodes format-specific configuration parameters and
/// shapes format-specific members of the credential request body.
pub trait FormatCodec: Send + Sync {
    /// The format discriminator this codec handles.
    fn format(&self) -> &'static str;

    /// Decode the format-specific parameters of a credential configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when required format parameters are missing.
    fn decode_supported(&self, config: &Value) -> anyhow::Result<FormatProfile>;

    /// Produce the format-specific members of a credential request body for
    /// the given claim set, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the claim set does not fit the format.
    fn encode_request(
        &self, profile: &FormatProfile, claim_set: Option<&Value>,
    ) -> anyhow::Result<Map<String, Value>>;
}

struct MsoMdocCodec;

impl FormatCodec for MsoMdocCodec {
    fn format(&self) -> &'static str {
        MSO_MDOC
    }

    fn decode_supported(&self, config: &Value) -> anyhow::Result<FormatProfile> {
        FormatProfile::from_value(config.clone()).map_err(|e| anyhow!(e))
    }

    fn encode_request(
        &self, profile: &FormatProfile, claim_set: Option<&Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        let FormatProfile::MsoMdoc { .. } = profile else {
            bail!("configuration is not an mso_mdoc profile");
        };
        let mut members = Map::new();
        if let Some(claims) = claim_set {
            if !claims.is_array() {
                bail!("mso_mdoc claim set must be an array of claims path pointers");
            }
            members.insert("claims".to_string(), claims.clone());
        }
        Ok(members)
    }
}

struct DcSdJwtCodec;

impl FormatCodec for DcSdJwtCodec {
    fn format(&self) -> &'static str {
        DC_SD_JWT
    }

    fn decode_supported(&self, config: &Value) -> anyhow::Result<FormatProfile> {
        FormatProfile::from_value(config.clone()).map_err(|e| anyhow!(e))
    }

    fn encode_request(
        &self, profile: &FormatProfile, claim_set: Option<&Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        let FormatProfile::DcSdJwt { .. } = profile else {
            bail!("configuration is not a dc+sd-jwt profile");
        };
        let mut members = Map::new();
        if let Some(claims) = claim_set {
            if !claims.is_array() {
                bail!("dc+sd-jwt claim set must be an array of claims path pointers");
            }
            members.insert("claims".to_string(), claims.clone());
        }
        Ok(members)
    }
}

/// The format table consulted by offer resolution and credential request
/// construction.
pub struct FormatRegistry {
    codecs: BTreeMap<&'static str, Box<dyn FormatCodec>>,
}

impl FormatRegistry {
    /// A registry with the built-in `mso_mdoc` and `dc+sd-jwt` codecs.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self { codecs: BTreeMap::new() };
        registry.register(Box::new(MsoMdocCodec));
        registry.register(Box::new(DcSdJwtCodec));
        registry
    }

    /// Register a codec, replacing any existing codec for the same format.
    pub fn register(&mut self, codec: Box<dyn FormatCodec>) {
        self.codecs.insert(codec.format(), codec);
    }

    /// Look up the codec for a format discriminator.
    #[must_use]
    pub fn codec(&self, format: &str) -> Option<&dyn FormatCodec> {
        self.codecs.get(format).map(|codec| &**codec)
    }

    /// Decode the format-specific parameters of a credential configuration,
    /// falling back to an opaque profile for unregistered formats.
    ///
    /// # Errors
    ///
    /// Returns an error when a registered codec rejects the configuration.
    pub fn decode(&self, config: &Value) -> anyhow::Result<FormatProfile> {
        let format = config.get("format").and_then(Value::as_str);
        match format.and_then(|f| self.codec(f)) {
            Some(codec) => codec.decode_supported(config),
            None => Ok(FormatProfile::Other(config.clone())),
        }
    }

    /// Produce the format-specific members of a credential request body.
    /// Formats without a registered codec contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns an error when the codec rejects the claim set.
    pub fn encode_request(
        &self, profile: &FormatProfile, claim_set: Option<&Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        match profile.format().and_then(|f| self.codec(f)) {
            Some(codec) => codec.encode_request(profile, claim_set),
            None => {
                if claim_set.is_some() {
                    bail!("no codec registered to encode a claim set for this format");
                }
                Ok(Map::new())
            }
        }
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
