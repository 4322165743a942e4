//! # JOSE
//!
//! The subset of JOSE this crate needs in-house: JWK structures, compact JWS
//! assembly over a pluggable [`Signer`](crate::provider::Signer), and
//! signature verification for signed issuer metadata. Encryption (JWE) is
//! delegated entirely to the [`ResponseDecryptor`](crate::provider::ResponseDecryptor)
//! collaborator.

pub mod jwk;
pub mod jws;

pub use jwk::{Curve, JwkSet, KeyType, KeyUse, PublicKeyJwk};
pub use jws::{Algorithm, Header, JwsParts, JwtType, KeyBinding};
