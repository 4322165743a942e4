//! # Deferred Issuance
//!
//! Polls the deferred credential endpoint with a transaction id until the
//! credential is issued or the transaction fails. Safe to repeat: the
//! transaction progresses monotonically from pending to issued or failed.

use crate::client_auth::ClientAuthenticator;
use crate::error::{Error, Result, code};
use crate::issuance::{AuthorizedRequest, DeferredOutcome};
use crate::issuer::{Body, Issuer};
use crate::provider::{HttpClient, Signer};
use crate::types::{
    CredentialResponse, CredentialResponseKind, DeferredCredentialRequest, IssuedCredential,
};

impl<H: HttpClient, C: ClientAuthenticator, D: Signer> Issuer<H, C, D> {
    /// Redeem a deferred issuance transaction.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the issuer advertises no deferred
    /// credential endpoint; transport failures propagate. Protocol-level
    /// failure states (`issuance_pending`, `invalid_transaction_id`, …)
    /// are reported through the outcome, not as errors.
    pub async fn query_for_deferred(
        &self, authorized: AuthorizedRequest, transaction_id: &str,
    ) -> Result<(AuthorizedRequest, DeferredOutcome)> {
        tracing::debug!("Issuer::query_for_deferred");

        let Some(endpoint) = &self.offer.issuer_metadata.deferred_credential_endpoint else {
            return Err(Error::Validation(
                "issuer does not support deferred credential issuance".into(),
            ));
        };

        let request = DeferredCredentialRequest {
            transaction_id: transaction_id.to_string(),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| Error::Validation(format!("issue encoding request: {e}")))?;
        let headers = vec![self.auth_header(&authorized)?];
        let response = self
            .post(endpoint, Body::Json(&body), &headers, Some(authorized.access_token()))
            .await?;

        // servers answer "not yet" with an issuance_pending body, on 202 as
        // well as on error statuses
        if let Some(error) = response.oauth_error() {
            let outcome = if error.error == code::ISSUANCE_PENDING {
                DeferredOutcome::Pending { interval: error.interval }
            } else {
                DeferredOutcome::Failed {
                    error: error.error,
                    description: error.error_description,
                }
            };
            return Ok((authorized, outcome));
        }

        if response.is_success() {
            let decoded: CredentialResponse = response.json()?;
            let authorized = match &decoded.c_nonce {
                Some(c_nonce) => {
                    authorized.with_nonce(c_nonce.clone(), decoded.c_nonce_expires_in)
                }
                None => authorized,
            };
            let outcome = match decoded.kind {
                CredentialResponseKind::Credential(credential) => DeferredOutcome::Issued {
                    credentials: vec![IssuedCredential { credential }],
                    notification_id: decoded.notification_id,
                },
                CredentialResponseKind::Credentials(credentials) => DeferredOutcome::Issued {
                    credentials,
                    notification_id: decoded.notification_id,
                },
                // still deferred under a (new) transaction id
                CredentialResponseKind::TransactionId(_) => {
                    DeferredOutcome::Pending { interval: None }
                }
            };
            return Ok((authorized, outcome));
        }

        Err(Error::Transport(format!("deferred endpoint returned {}", response.status)))
    }
}
