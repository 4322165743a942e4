//! # Nonce Endpoint
//!
//! Proactively fetches a fresh `c_nonce` from the issuer's nonce endpoint,
//! moving the session into the proof-required state before the first
//! credential request.

use serde_json::json;

use crate::client_auth::ClientAuthenticator;
use crate::error::{Error, Result};
use crate::issuance::AuthorizedRequest;
use crate::issuer::Issuer;
use crate::provider::{HttpClient, Signer};
use crate::types::NonceResponse;

impl<H: HttpClient, C: ClientAuthenticator, D: Signer> Issuer<H, C, D> {
    /// Fetch a fresh `c_nonce` from the nonce endpoint. The endpoint is
    /// unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the issuer advertises no nonce
    /// endpoint.
    pub async fn fresh_nonce(&self, authorized: AuthorizedRequest) -> Result<AuthorizedRequest> {
        tracing::debug!("Issuer::fresh_nonce");

        let Some(endpoint) = &self.offer.issuer_metadata.nonce_endpoint else {
            return Err(Error::Validation("issuer does not advertise a nonce endpoint".into()));
        };

        let response = self.http.post_json(endpoint, &json!({}), &[]).await?;
        if let Some(engine) = &self.dpop {
            engine.observe(&response);
        }
        if !response.is_success() {
            return Err(response.oauth_error().map_or_else(
                || Error::Transport(format!("nonce endpoint returned {}", response.status)),
                Into::into,
            ));
        }

        let nonce: NonceResponse = response.json()?;
        if nonce.c_nonce.is_empty() {
            return Err(Error::Validation("nonce endpoint returned an empty c_nonce".into()));
        }
        Ok(authorized.with_nonce(nonce.c_nonce, nonce.c_nonce_expires_in))
    }
}
