//! # Token Exchange
//!
//! Exchanges an authorization code or pre-authorized code for an access
//! token, and refreshes an authorized session.

use crate::client_auth::ClientAuthenticator;
use crate::error::{Error, Result};
use crate::issuance::{AuthorizedRequest, CodeHeld};
use crate::issuer::{Body, Issuer};
use crate::provider::{HttpClient, Signer};
use crate::types::{TokenGrantType, TokenRequest, TokenResponse, TokenType};

impl<H: HttpClient, C: ClientAuthenticator, D: Signer> Issuer<H, C, D> {
    /// Exchange a held authorization code for an access token, consuming the
    /// code and the PKCE verifier bound to it.
    ///
    /// # Errors
    ///
    /// Returns `Error::OAuth` for structured token endpoint errors and
    /// `Error::Validation` for malformed token responses.
    pub async fn exchange_code(&self, mut held: CodeHeld) -> Result<AuthorizedRequest> {
        tracing::debug!("Issuer::exchange_code");

        let request = TokenRequest {
            client_id: None, // contributed by the authenticator
            grant_type: TokenGrantType::AuthorizationCode {
                code: std::mem::take(&mut held.code),
                redirect_uri: Some(self.config.redirect_uri.clone()),
                code_verifier: Some(std::mem::take(&mut held.pkce_verifier)),
            },
            authorization_details: None,
        };
        self.token_request(request).await
    }

    /// Authorize with the offer's pre-authorized code. When the offer
    /// declares a transaction code, `tx_code` must be supplied and match the
    /// declared shape.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the offer carries no pre-authorized
    /// grant, a required `tx_code` is missing or malformed; `Error::OAuth`
    /// for token endpoint failures.
    pub async fn pre_authorized(&self, tx_code: Option<String>) -> Result<AuthorizedRequest> {
        tracing::debug!("Issuer::pre_authorized");

        let Some(grant) =
            self.offer.grants.as_ref().and_then(|grants| grants.pre_authorized_code.clone())
        else {
            return Err(Error::Validation("offer has no pre-authorized code grant".into()));
        };

        if let Some(expected) = &grant.tx_code {
            let Some(code) = &tx_code else {
                return Err(Error::Validation("offer requires a transaction code".into()));
            };
            expected.validate(code)?;
        }

        let request = TokenRequest {
            client_id: None,
            grant_type: TokenGrantType::PreAuthorizedCode {
                pre_authorized_code: grant.pre_authorized_code,
                tx_code,
            },
            authorization_details: None,
        };
        self.token_request(request).await
    }

    /// Exchange the session's refresh token for a fresh access token,
    /// preserving the DPoP binding. The previous `c_nonce`, when held,
    /// carries over; nonce lifetime is independent of the token's.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the session holds no refresh token.
    pub async fn refresh(&self, authorized: AuthorizedRequest) -> Result<AuthorizedRequest> {
        tracing::debug!("Issuer::refresh");

        let Some(refresh_token) = authorized.refresh_token() else {
            return Err(Error::Validation("session has no refresh token".into()));
        };

        let request = TokenRequest {
            client_id: None,
            grant_type: TokenGrantType::RefreshToken {
                refresh_token: refresh_token.to_string(),
            },
            authorization_details: None,
        };
        let mut refreshed = self.token_request(request).await?;

        // retain the prior nonce and refresh token when the response is
        // silent about them
        if refreshed.c_nonce().is_none() {
            if let Some(c_nonce) = authorized.c_nonce() {
                refreshed = refreshed.with_nonce(c_nonce.to_string(), None);
            }
        }
        if refreshed.refresh_token().is_none() {
            let previous = authorized.refresh_token().map(ToString::to_string);
            match &mut refreshed {
                AuthorizedRequest::NoProofRequired { refresh_token, .. }
                | AuthorizedRequest::ProofRequired { refresh_token, .. } => {
                    *refresh_token = previous;
                }
            }
        }
        Ok(refreshed)
    }

    // POST a token request with client authentication and DPoP, mapping the
    // response into an authorized session state.
    async fn token_request(&self, request: TokenRequest) -> Result<AuthorizedRequest> {
        let mut form = request.form_encode()?;
        let server = &self.offer.authorization_server;
        let headers = self.client.authenticate(&server.issuer, &mut form).await?;

        let response =
            self.post(&server.token_endpoint, Body::Form(&form), &headers, None).await?;
        if !response.is_success() {
            return Err(response.oauth_error().map_or_else(
                || Error::Transport(format!("token endpoint returned {}", response.status)),
                Into::into,
            ));
        }

        let token: TokenResponse = response.json()?;
        self.into_authorized(token)
    }

    // Map a token response into session state, enforcing the token-type
    // invariants.
    fn into_authorized(&self, token: TokenResponse) -> Result<AuthorizedRequest> {
        if token.access_token.is_empty() {
            return Err(Error::Validation("token response has an empty access token".into()));
        }
        if token.token_type == TokenType::DPoP && self.dpop.is_none() {
            return Err(Error::Validation(
                "server granted a DPoP-bound token but no DPoP signer is configured".into(),
            ));
        }

        Ok(match token.c_nonce {
            Some(c_nonce) => AuthorizedRequest::ProofRequired {
                access_token: token.access_token,
                token_type: token.token_type,
                refresh_token: token.refresh_token,
                expires_in: token.expires_in,
                c_nonce,
                c_nonce_expires_in: token.c_nonce_expires_in,
            },
            None => AuthorizedRequest::NoProofRequired {
                access_token: token.access_token,
                token_type: token.token_type,
                refresh_token: token.refresh_token,
                expires_in: token.expires_in,
            },
        })
    }
}
