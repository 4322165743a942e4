//! # Issuer Notifications
//!
//! Tells the issuer what became of an issued credential. Semantically
//! fire-and-forget: failures are surfaced but carry no session state
//! change, so issuance is never blocked on a notification.

use crate::client_auth::ClientAuthenticator;
use crate::error::{Error, Result};
use crate::issuance::AuthorizedRequest;
use crate::issuer::{Body, Issuer};
use crate::provider::{HttpClient, Signer};
use crate::types::NotificationRequest;

impl<H: HttpClient, C: ClientAuthenticator, D: Signer> Issuer<H, C, D> {
    /// Post a notification event for an issued credential.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the issuer advertises no
    /// notification endpoint; `Error::OAuth` or `Error::Transport` when the
    /// post fails. None of these affect the issuance session.
    pub async fn notify(
        &self, authorized: &AuthorizedRequest, request: &NotificationRequest,
    ) -> Result<()> {
        tracing::debug!("Issuer::notify");

        let Some(endpoint) = &self.offer.issuer_metadata.notification_endpoint else {
            return Err(Error::Validation("issuer does not support notifications".into()));
        };

        let body = serde_json::to_value(request)
            .map_err(|e| Error::Validation(format!("issue encoding notification: {e}")))?;
        let headers = vec![self.auth_header(authorized)?];
        let response = self
            .post(endpoint, Body::Json(&body), &headers, Some(authorized.access_token()))
            .await?;

        if !response.is_success() {
            return Err(response.oauth_error().map_or_else(
                || Error::Transport(format!("notification endpoint returned {}", response.status)),
                Into::into,
            ));
        }
        Ok(())
    }
}
