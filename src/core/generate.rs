//! # Random Value Generation
//!
//! Random unreserved strings for request parameters, and the PKCE material
//! derived from them.

use std::ops::RangeInclusive;

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};

/// Characters that can appear in URLs and form bodies without escaping
/// ("unreserved" per RFC 3986). Also the code verifier alphabet of
/// RFC 7636.
pub const UNRESERVED: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-.~_";

// Length bounds of a PKCE code verifier (RFC 7636 §4.1).
const VERIFIER_LEN: RangeInclusive<usize> = 43..=128;

/// Generate a random string of the requested length, drawing from the
/// provided character set.
#[must_use]
pub fn random_string(len: usize, charset: &str) -> String {
    let chars: Vec<char> = charset.chars().collect();
    (0..len).map(|_| chars[fastrand::usize(..chars.len())]).collect()
}

/// Generate a random `state` value for an authorization request.
#[must_use]
pub fn state() -> String {
    random_string(32, UNRESERVED)
}

/// A PKCE code verifier together with the `S256` challenge derived from it.
/// Generated as a pair so verifier and challenge cannot drift apart: the
/// challenge goes into the authorization request, the verifier is held back
/// for token exchange.
pub struct PkcePair {
    /// The code verifier. Held by the wallet, redeemed exactly once at the
    /// token endpoint.
    pub verifier: String,

    /// The `S256` code challenge sent in the authorization request.
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier and derive its challenge.
    #[must_use]
    pub fn new() -> Self {
        let verifier = random_string(fastrand::usize(VERIFIER_LEN), UNRESERVED);
        Self {
            challenge: code_challenge(&verifier),
            verifier,
        }
    }
}

impl Default for PkcePair {
    fn default() -> Self {
        Self::new()
    }
}

/// The `S256` code challenge for a PKCE code verifier (RFC 7636 §4.2):
/// base64url-encoded SHA-256 of the verifier.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    Base64UrlUnpadded::encode_string(&Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_string_charset() {
        let s = random_string(64, UNRESERVED);
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| UNRESERVED.contains(c)));
    }

    #[test]
    fn pkce_pair_shape() {
        for _ in 0..20 {
            let pkce = PkcePair::new();
            assert!(VERIFIER_LEN.contains(&pkce.verifier.len()));
            assert!(pkce.verifier.chars().all(|c| UNRESERVED.contains(c)));
            assert_eq!(pkce.challenge, code_challenge(&pkce.verifier));
        }
    }

    // RFC 7636 appendix B example.
    #[test]
    fn challenge_s256() {
        let challenge = code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }
}
