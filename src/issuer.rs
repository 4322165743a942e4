//! # Issuer Facade
//!
//! [`Issuer`] orchestrates one issuance session against a resolved
//! credential offer: authorization (PAR or full authorization URL, or the
//! pre-authorized code flow), token exchange, credential requests, deferred
//! polling, and notifications. It holds the immutable metadata,
//! configuration, client authenticator, and the optional DPoP engine; every
//! flow operation consumes its state value and returns the next one.

use std::collections::HashMap;

use serde_json::Value;

use crate::client_auth::ClientAuthenticator;
use crate::dpop::{self, DpopEngine};
use crate::error::{Error, Result};
use crate::format::FormatRegistry;
use crate::issuance::AuthorizedRequest;
use crate::metadata::SignedMetadataPolicy;
use crate::offer::{self, ResolvedOffer};
use crate::provider::{HttpClient, HttpResponse, Signer};
use crate::types::{CredentialOfferRequest, TokenType};

/// Whether authorization requests favor OAuth scopes or rich authorization
/// details when both could express the request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthorizeStrategy {
    /// Use scope values where the issuer exposes them, authorization details
    /// for the rest.
    FavorScopes,

    /// Always use `authorization_details`.
    #[default]
    FavorAuthorizationDetails,
}

/// Issuance session configuration.
#[derive(Clone, Debug)]
pub struct IssuerConfig {
    /// The wallet's redirection endpoint, as registered with the
    /// authorization server.
    pub redirect_uri: String,

    /// Scope vs. authorization-details preference.
    pub authorize_strategy: AuthorizeStrategy,

    /// Use pushed authorization requests when the server advertises them.
    pub use_par: bool,

    /// How signed issuer metadata is treated during offer resolution.
    pub metadata_policy: SignedMetadataPolicy,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            redirect_uri: String::new(),
            authorize_strategy: AuthorizeStrategy::default(),
            use_par: true,
            metadata_policy: SignedMetadataPolicy::default(),
        }
    }
}

/// A credential issuer the wallet is running an issuance session against.
pub struct Issuer<H: HttpClient, C: ClientAuthenticator, D: Signer> {
    pub(crate) http: H,
    pub(crate) client: C,
    pub(crate) dpop: Option<DpopEngine<D>>,
    pub(crate) config: IssuerConfig,
    pub(crate) offer: ResolvedOffer,
    pub(crate) registry: FormatRegistry,
}

impl<H: HttpClient, C: ClientAuthenticator, D: Signer> Issuer<H, C, D> {
    /// Create a session facade over an already resolved offer.
    ///
    /// When a DPoP engine is supplied, its algorithm must be among the
    /// authorization server's `dpop_signing_alg_values_supported`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when DPoP is configured but the
    /// authorization server does not support it (or not with the engine's
    /// algorithm).
    pub fn new(
        http: H, client: C, dpop: Option<DpopEngine<D>>, config: IssuerConfig,
        offer: ResolvedOffer,
    ) -> Result<Self> {
        if let Some(engine) = &dpop {
            let Some(algs) = &offer.authorization_server.dpop_signing_alg_values_supported else {
                return Err(Error::Validation(
                    "DPoP configured but the authorization server does not advertise it".into(),
                ));
            };
            let alg = engine.algorithm().to_string();
            if !algs.contains(&alg) {
                return Err(Error::Validation(format!(
                    "DPoP algorithm {alg} is not supported by the authorization server"
                )));
            }
        }

        Ok(Self {
            http,
            client,
            dpop,
            config,
            offer,
            registry: FormatRegistry::standard(),
        })
    }

    /// Resolve a credential offer under this configuration's metadata
    /// policy, then create the session facade.
    ///
    /// # Errors
    ///
    /// Propagates offer resolution and construction failures.
    pub async fn resolve(
        http: H, client: C, dpop: Option<DpopEngine<D>>, config: IssuerConfig,
        request: &CredentialOfferRequest,
    ) -> Result<Self> {
        let registry = FormatRegistry::standard();
        let offer = offer::resolve(&http, request, &config.metadata_policy, &registry).await?;
        Self::new(http, client, dpop, config, offer)
    }

    /// Replace the format registry consulted for offer profiles and claim
    /// set encoding.
    #[must_use]
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The resolved offer this session is driving towards.
    #[must_use]
    pub const fn offer(&self) -> &ResolvedOffer {
        &self.offer
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// The `Authorization` header for an authorized request. The scheme
    /// always matches the granted token type.
    pub(crate) fn auth_header(&self, authorized: &AuthorizedRequest) -> Result<(String, String)> {
        if authorized.token_type() == TokenType::DPoP && self.dpop.is_none() {
            return Err(Error::Validation(
                "access token is DPoP-bound but no DPoP signer is configured".into(),
            ));
        }
        Ok((
            "Authorization".to_string(),
            format!("{} {}", authorized.token_type().scheme(), authorized.access_token()),
        ))
    }

    /// POST with DPoP attached when configured, recording any `DPoP-Nonce`
    /// and retrying exactly once when the server demands a (new) nonce.
    pub(crate) async fn post(
        &self, url: &str, body: Body<'_>, headers: &[(String, String)],
        access_token: Option<&str>,
    ) -> Result<HttpResponse> {
        let mut retried = false;
        loop {
            let mut attached = headers.to_vec();
            if let Some(engine) = &self.dpop {
                let proof = engine.proof("POST", url, access_token).await?;
                attached.push(("DPoP".to_string(), proof));
            }

            let response = match body {
                Body::Form(form) => self.http.post_form(url, form, &attached).await?,
                Body::Json(json) => self.http.post_json(url, json, &attached).await?,
            };

            if let Some(engine) = &self.dpop {
                engine.observe(&response);
                if !retried && dpop::wants_nonce_retry(&response) {
                    retried = true;
                    continue;
                }
            }
            return Ok(response);
        }
    }
}

/// Body of an outgoing POST.
#[derive(Clone, Copy)]
pub(crate) enum Body<'a> {
    /// `application/x-www-form-urlencoded`.
    Form(&'a HashMap<String, String>),

    /// `application/json`.
    Json(&'a Value),
}
