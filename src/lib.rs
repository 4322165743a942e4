//! A wallet-side client for [OpenID for Verifiable Credential Issuance]
//! (draft 15).
//!
//! The crate covers the issuance state machine and the resolution pipeline
//! feeding it: credential offer handling (by value, by reference, or deep
//! link), issuer and authorization server metadata discovery (including
//! signed metadata), authorization through the authorization code flow
//! (PKCE, optional PAR, DPoP, Attestation-Based Client Authentication) or
//! the pre-authorized code flow, and credential requests with proofs of
//! possession, optional response encryption, deferred retrieval, and issuer
//! notifications.
//!
//! HTTP transport, signing keys, wallet attestations, and JWE decryption
//! are injected through the traits in [`provider`]; the crate performs no
//! I/O of its own and stores nothing.
//!
//! [OpenID for Verifiable Credential Issuance]: https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html

pub mod client_auth;
mod core;
pub mod dpop;
mod error;
pub mod format;
pub mod issuance;
pub mod issuer;
pub mod jose;
pub mod metadata;
pub mod offer;
pub mod provider;
pub mod types;

pub use crate::core::generate;
pub use crate::error::{Error, OAuthErrorResponse, Result};
pub use crate::issuance::{
    AuthorizedRequest, CodeHeld, DeferredOutcome, IssuanceRequestPayload, PreparedAuthorization,
    SubmissionOutcome,
};
pub use crate::issuer::{AuthorizeStrategy, Issuer, IssuerConfig};
pub use crate::metadata::{SignedMetadataPolicy, TrustSource};
pub use crate::offer::{OfferedCredential, ResolvedOffer};
