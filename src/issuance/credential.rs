//! # Credential Requests
//!
//! Builds and submits credential requests: proof(s) of possession over the
//! current `c_nonce`, format-specific claim sets through the codec
//! registry, optional response encryption, and interpretation of the
//! issuer's reply into a submission outcome.

use chrono::Utc;
use serde_json::Value;

use crate::client_auth::ClientAuthenticator;
use crate::error::{Error, Result, code};
use crate::issuance::{AuthorizedRequest, IssuanceRequestPayload, SubmissionOutcome};
use crate::issuer::{Body, Issuer};
use crate::jose::jws::{self, JwtType};
use crate::provider::{HttpClient, HttpResponse, ResponseDecryptor, Signer};
use crate::types::{
    CredentialRequest, CredentialResponse, CredentialResponseEncryption, CredentialResponseKind,
    IssuedCredential, MultipleProofs, Proof, ProofClaims, SingleProof,
};

impl<H: HttpClient, C: ClientAuthenticator, D: Signer> Issuer<H, C, D> {
    /// Submit a credential request.
    ///
    /// One proof JWT is produced per signer, each bound to the session's
    /// current `c_nonce`; more than one signer requires the issuer to
    /// advertise batch issuance. Response encryption is negotiated through
    /// `encryption` when the issuer requires it or the wallet opts in.
    ///
    /// Returns the successor session state (with the `c_nonce` refreshed
    /// whenever the response carried one) and the submission outcome. An
    /// [`SubmissionOutcome::InvalidProof`] outcome is not retried here: the
    /// returned state already holds the fresh nonce, so the caller can
    /// re-sign and resubmit.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedFeature` for identifier-based payloads,
    /// `Error::Validation` for unknown configurations or missing signers,
    /// and `Error::Cryptographic` for signing and decryption failures.
    pub async fn request_credential<S: Signer, E: ResponseDecryptor>(
        &self, authorized: AuthorizedRequest, payload: &IssuanceRequestPayload,
        proof_signers: &[S], encryption: Option<&E>,
    ) -> Result<(AuthorizedRequest, SubmissionOutcome)> {
        tracing::debug!("Issuer::request_credential");

        let (configuration_id, claim_set) = match payload {
            IssuanceRequestPayload::ConfigurationBased {
                credential_configuration_id,
                claim_set,
            } => (credential_configuration_id, claim_set.as_ref()),
            IssuanceRequestPayload::IdentifierBased { .. } => {
                return Err(Error::UnsupportedFeature(
                    "identifier-based credential requests".into(),
                ));
            }
        };

        let Some(config) = self
            .offer
            .issuer_metadata
            .credential_configurations_supported
            .get(configuration_id)
        else {
            return Err(Error::Validation(format!(
                "configuration {configuration_id} is not supported by the issuer"
            )));
        };

        let proof = self.build_proof(&authorized, proof_signers).await?;
        let response_encryption = self.negotiate_encryption(encryption).await?;
        let decrypt_with = response_encryption
            .as_ref()
            .map(|(_, handle)| handle.clone());

        let request = CredentialRequest {
            credential_configuration_id: configuration_id.clone(),
            proof: Some(proof),
            credential_response_encryption: response_encryption.map(|(spec, _)| spec),
        };
        let mut body = serde_json::to_value(&request)
            .map_err(|e| Error::Validation(format!("issue encoding request: {e}")))?;

        let members = self
            .registry
            .encode_request(&config.profile, claim_set)
            .map_err(|e| Error::Validation(format!("issue encoding claim set: {e}")))?;
        if let Value::Object(map) = &mut body {
            map.extend(members);
        }

        let headers = vec![self.auth_header(&authorized)?];
        let response = self
            .post(
                &self.offer.issuer_metadata.credential_endpoint,
                Body::Json(&body),
                &headers,
                Some(authorized.access_token()),
            )
            .await?;

        self.interpret_submission(authorized, &response, encryption, decrypt_with.as_deref())
            .await
    }

    // One proof JWT per signer, over the current nonce.
    async fn build_proof<S: Signer>(
        &self, authorized: &AuthorizedRequest, proof_signers: &[S],
    ) -> Result<Proof> {
        if proof_signers.is_empty() {
            return Err(Error::Validation("at least one proof signer is required".into()));
        }
        if proof_signers.len() > 1 {
            let Some(batch) = &self.offer.issuer_metadata.batch_credential_issuance else {
                return Err(Error::Validation(
                    "issuer does not advertise batch credential issuance".into(),
                ));
            };
            if proof_signers.len() as i64 > batch.batch_size {
                return Err(Error::Validation(format!(
                    "batch size {} exceeds the issuer's limit {}",
                    proof_signers.len(),
                    batch.batch_size
                )));
            }
        }

        let client_id = self.client.client_id();
        let claims = ProofClaims {
            iss: (!client_id.is_empty()).then(|| client_id.to_string()),
            aud: self.offer.credential_issuer.to_string(),
            iat: Utc::now().timestamp(),
            nonce: authorized.c_nonce().map(ToString::to_string),
        };

        let mut jwts = Vec::with_capacity(proof_signers.len());
        for signer in proof_signers {
            let jwt = jws::encode(JwtType::ProofJwt, &claims, signer)
                .await
                .map_err(|e| Error::Cryptographic(format!("issue signing proof: {e}")))?;
            jwts.push(jwt);
        }

        if jwts.len() == 1 {
            let jwt = jwts.remove(0);
            Ok(Proof::Single {
                proof_type: SingleProof::Jwt { jwt },
            })
        } else {
            Ok(Proof::Multiple(MultipleProofs::Jwt(jwts)))
        }
    }

    // Negotiate response encryption: mandatory when the issuer requires it,
    // opt-in otherwise. The chosen alg/enc must be within the issuer's
    // advertised sets.
    async fn negotiate_encryption<E: ResponseDecryptor>(
        &self, encryption: Option<&E>,
    ) -> Result<Option<(CredentialResponseEncryption, String)>> {
        let supported = self.offer.issuer_metadata.credential_response_encryption.as_ref();

        let Some(supported) = supported else {
            return Ok(None);
        };
        let Some(decryptor) = encryption else {
            if supported.encryption_required {
                return Err(Error::Validation(
                    "issuer requires credential response encryption".into(),
                ));
            }
            return Ok(None);
        };

        let spec = decryptor
            .prepare(supported)
            .await
            .map_err(|e| Error::Cryptographic(format!("issue preparing encryption key: {e}")))?;
        if !supported.alg_values_supported.contains(&spec.alg) {
            return Err(Error::Cryptographic(format!(
                "encryption alg {} is not advertised by the issuer",
                spec.alg
            )));
        }
        if !supported.enc_values_supported.contains(&spec.enc) {
            return Err(Error::Cryptographic(format!(
                "encryption enc {} is not advertised by the issuer",
                spec.enc
            )));
        }

        Ok(Some((
            CredentialResponseEncryption {
                jwk: spec.jwk,
                alg: spec.alg,
                enc: spec.enc,
            },
            spec.key_handle,
        )))
    }

    // Map the credential endpoint's reply into (successor state, outcome).
    async fn interpret_submission<E: ResponseDecryptor>(
        &self, authorized: AuthorizedRequest, response: &HttpResponse, encryption: Option<&E>,
        decrypt_with: Option<&str>,
    ) -> Result<(AuthorizedRequest, SubmissionOutcome)> {
        if response.is_success() {
            let decoded: CredentialResponse = match (encryption, decrypt_with) {
                (Some(decryptor), Some(handle)) => {
                    let plaintext = decryptor
                        .decrypt(handle, response.text().trim())
                        .await
                        .map_err(|e| {
                            Error::Cryptographic(format!("issue decrypting response: {e}"))
                        })?;
                    serde_json::from_slice(&plaintext).map_err(|e| {
                        Error::Cryptographic(format!("issue decoding decrypted response: {e}"))
                    })?
                }
                _ => response.json()?,
            };

            let authorized = match &decoded.c_nonce {
                Some(c_nonce) => {
                    authorized.with_nonce(c_nonce.clone(), decoded.c_nonce_expires_in)
                }
                None => authorized,
            };

            let outcome = match decoded.kind {
                CredentialResponseKind::Credential(credential) => SubmissionOutcome::Success {
                    credentials: vec![IssuedCredential { credential }],
                    notification_id: decoded.notification_id,
                },
                CredentialResponseKind::Credentials(credentials) => SubmissionOutcome::Success {
                    credentials,
                    notification_id: decoded.notification_id,
                },
                CredentialResponseKind::TransactionId(transaction_id) => {
                    SubmissionOutcome::Deferred { transaction_id }
                }
            };
            return Ok((authorized, outcome));
        }

        let Some(error) = response.oauth_error() else {
            return Err(Error::Transport(format!(
                "credential endpoint returned {}",
                response.status
            )));
        };

        if error.error == code::INVALID_PROOF {
            let Some(c_nonce) = error.c_nonce else {
                return Ok((
                    authorized,
                    SubmissionOutcome::Failed {
                        error: error.error,
                        description: error.error_description,
                    },
                ));
            };
            let authorized =
                authorized.with_nonce(c_nonce.clone(), error.c_nonce_expires_in);
            return Ok((
                authorized,
                SubmissionOutcome::InvalidProof {
                    c_nonce,
                    c_nonce_expires_in: error.c_nonce_expires_in,
                    description: error.error_description,
                },
            ));
        }

        Ok((
            authorized,
            SubmissionOutcome::Failed {
                error: error.error,
                description: error.error_description,
            },
        ))
    }
}
