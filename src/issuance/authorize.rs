//! # Authorization Preparation
//!
//! Builds the authorization request for the authorization code flow:
//! generates the PKCE pair, expresses the requested credentials as scopes
//! and/or authorization details, pushes the request (PAR) when the server
//! supports it, and binds the redirect code back to the session.

use std::collections::HashMap;

use crate::client_auth::ClientAuthenticator;
use crate::core::generate;
use crate::error::{Error, Result};
use crate::issuance::{CodeHeld, PreparedAuthorization};
use crate::issuer::{AuthorizeStrategy, Body, Issuer};
use crate::offer::OfferedCredential;
use crate::provider::{HttpClient, Signer};
use crate::types::{AuthorizationDetail, ParResponse};

impl<H: HttpClient, C: ClientAuthenticator, D: Signer> Issuer<H, C, D> {
    /// Prepare an authorization request for the given offered configuration
    /// ids, pushing it to the PAR endpoint when the server advertises one
    /// (and configuration does not disable it), otherwise encoding the full
    /// authorization URL.
    ///
    /// `wallet_state` overrides the generated `state` parameter when the
    /// wallet needs its own correlation value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for configuration ids outside the offer,
    /// `Error::Metadata` when the server requires PAR but advertises no
    /// endpoint, and propagates PAR transport and OAuth failures.
    pub async fn prepare_authorization(
        &self, configuration_ids: &[String], wallet_state: Option<String>,
    ) -> Result<PreparedAuthorization> {
        tracing::debug!("Issuer::prepare_authorization");

        for id in configuration_ids {
            if !self.offer.offered.iter().any(|offered| offered.configuration_id() == id.as_str()) {
                return Err(Error::Validation(format!(
                    "configuration {id} is not part of the offer"
                )));
            }
        }
        if configuration_ids.is_empty() {
            return Err(Error::Validation("no credential configurations requested".into()));
        }

        let pkce = generate::PkcePair::new();
        let state = wallet_state.unwrap_or_else(generate::state);

        let mut form = HashMap::new();
        form.insert("response_type".to_string(), "code".to_string());
        form.insert("redirect_uri".to_string(), self.config.redirect_uri.clone());
        form.insert("code_challenge".to_string(), pkce.challenge);
        form.insert("code_challenge_method".to_string(), "S256".to_string());
        form.insert("state".to_string(), state.clone());

        let (scopes, details) = self.split_request(configuration_ids);
        if !scopes.is_empty() {
            form.insert("scope".to_string(), scopes.join(" "));
        }
        if !details.is_empty() {
            let encoded = serde_json::to_string(&details)
                .map_err(|e| Error::Validation(format!("issue encoding details: {e}")))?;
            form.insert("authorization_details".to_string(), encoded);
        }

        if let Some(issuer_state) = self
            .offer
            .grants
            .as_ref()
            .and_then(|grants| grants.authorization_code.as_ref())
            .and_then(|grant| grant.issuer_state.clone())
        {
            form.insert("issuer_state".to_string(), issuer_state);
        }

        let server = &self.offer.authorization_server;
        let par_required = server.require_pushed_authorization_requests.unwrap_or(false);
        let par_endpoint = server.pushed_authorization_request_endpoint.as_deref();

        if par_required && par_endpoint.is_none() {
            return Err(Error::Metadata(
                "server requires pushed authorization requests but advertises no endpoint".into(),
            ));
        }

        let use_par = par_endpoint.is_some() && (self.config.use_par || par_required);
        if let (true, Some(par_endpoint)) = (use_par, par_endpoint) {
            let headers = self.client.authenticate(&server.issuer, &mut form).await?;
            let response = self.post(par_endpoint, Body::Form(&form), &headers, None).await?;
            if !response.is_success() {
                return Err(response
                    .oauth_error()
                    .map_or_else(
                        || Error::Transport(format!("PAR returned {}", response.status)),
                        Into::into,
                    ));
            }
            let par: ParResponse = response.json()?;

            let query = build_query(&[
                ("client_id".to_string(), self.client.client_id().to_string()),
                ("request_uri".to_string(), par.request_uri.clone()),
                ("state".to_string(), state.clone()),
            ]);
            return Ok(PreparedAuthorization {
                authorization_url: format!("{}?{query}", server.authorization_endpoint),
                request_uri: Some(par.request_uri),
                state,
                configuration_ids: configuration_ids.to_vec(),
                pkce_verifier: pkce.verifier,
            });
        }

        // no PAR: the full request rides in the authorization URL
        form.insert("client_id".to_string(), self.client.client_id().to_string());
        let mut pairs: Vec<(String, String)> = form.into_iter().collect();
        pairs.sort();
        let query = build_query(&pairs);

        Ok(PreparedAuthorization {
            authorization_url: format!("{}?{query}", server.authorization_endpoint),
            request_uri: None,
            state,
            configuration_ids: configuration_ids.to_vec(),
            pkce_verifier: pkce.verifier,
        })
    }

    /// Bind the authorization code received on redirect to the prepared
    /// request, consuming it. The wallet must have checked the redirect's
    /// `state` parameter against [`PreparedAuthorization::state`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an empty code.
    pub fn handle_authorization_code(
        &self, mut prepared: PreparedAuthorization, code: &str,
    ) -> Result<CodeHeld> {
        if code.is_empty() {
            return Err(Error::Validation("authorization code is empty".into()));
        }
        Ok(CodeHeld {
            code: code.to_string(),
            configuration_ids: std::mem::take(&mut prepared.configuration_ids),
            pkce_verifier: std::mem::take(&mut prepared.pkce_verifier),
        })
    }

    // Split the requested configurations into scope values and
    // authorization details per the configured strategy. Configurations
    // without a scope always fall back to details.
    fn split_request(
        &self, configuration_ids: &[String],
    ) -> (Vec<String>, Vec<AuthorizationDetail>) {
        let mut scopes = Vec::new();
        let mut details = Vec::new();

        for id in configuration_ids {
            let offered =
                self.offer.offered.iter().find(|o| o.configuration_id() == id.as_str());
            match (self.config.authorize_strategy, offered) {
                (AuthorizeStrategy::FavorScopes, Some(OfferedCredential::ByScope { scope, .. })) => {
                    scopes.push(scope.clone());
                }
                _ => details.push(AuthorizationDetail::for_configuration(id.clone())),
            }
        }
        (scopes, details)
    }
}

// Percent-encode key/value pairs into a query string.
fn build_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
