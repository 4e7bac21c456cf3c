use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::config::InputLengthRestrictions;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::request::authorization_code::AuthorizationCode;
use crate::oauth_types::OAuthCodeChallengeMethod;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

// RFC 7636 section 4.1: unreserved characters only
static CODE_VERIFIER_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-._~]+$").expect("valid code verifier pattern"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PkceError {
    #[error("code challenge required")]
    MissingChallenge,
    #[error("transform algorithm not supported: {0}")]
    UnsupportedMethod(String),
    #[error("plain code challenge method not allowed for this client")]
    PlainNotAllowed,
    #[error("invalid code_challenge length")]
    InvalidChallengeLength,
    #[error("invalid code_verifier")]
    InvalidVerifier,
    #[error("code_verifier does not match code_challenge")]
    Mismatch,
}

impl From<PkceError> for OAuthError {
    fn from(error: PkceError) -> Self {
        OAuthError::InvalidRequestError(error.to_string())
    }
}

/// A code challenge accepted at authorization time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChallenge {
    pub challenge: String,
    pub method: OAuthCodeChallengeMethod,
}

pub struct PkceValidator {
    limits: InputLengthRestrictions,
}

impl PkceValidator {
    pub fn new(limits: InputLengthRestrictions) -> Self {
        PkceValidator { limits }
    }

    /// Authorization-time check of `code_challenge` and `code_challenge_method`.
    /// Returns `None` when no challenge was sent and the client does not need one.
    pub fn validate_challenge(
        &self,
        client: &Client,
        challenge: Option<&str>,
        method: Option<&str>,
    ) -> Result<Option<CodeChallenge>, PkceError> {
        let Some(challenge) = challenge.filter(|c| !c.is_empty()) else {
            if client.require_pkce {
                tracing::warn!(client_id = %client.client_id, "code_challenge is missing");
                return Err(PkceError::MissingChallenge);
            }
            return Ok(None);
        };

        if challenge.len() < self.limits.code_challenge_min_length
            || challenge.len() > self.limits.code_challenge_max_length
        {
            tracing::warn!(client_id = %client.client_id, "code_challenge is either too short or too long");
            return Err(PkceError::InvalidChallengeLength);
        }

        let method = match method.filter(|m| !m.is_empty()) {
            None => OAuthCodeChallengeMethod::Plain,
            Some(method) => method
                .parse::<OAuthCodeChallengeMethod>()
                .map_err(|_| PkceError::UnsupportedMethod(method.to_string()))?,
        };
        if method == OAuthCodeChallengeMethod::Plain && !client.allow_plain_text_pkce {
            tracing::warn!(client_id = %client.client_id, "code_challenge_method of plain is not allowed");
            return Err(PkceError::PlainNotAllowed);
        }

        Ok(Some(CodeChallenge {
            challenge: challenge.to_string(),
            method,
        }))
    }

    /// Check a verifier against a stored challenge.
    pub fn verify(
        &self,
        challenge: &str,
        method: OAuthCodeChallengeMethod,
        verifier: &str,
    ) -> Result<(), PkceError> {
        if verifier.len() < self.limits.code_verifier_min_length
            || verifier.len() > self.limits.code_verifier_max_length
            || !CODE_VERIFIER_CHARSET.is_match(verifier)
        {
            return Err(PkceError::InvalidVerifier);
        }
        let transformed = match method {
            OAuthCodeChallengeMethod::Plain => verifier.to_string(),
            OAuthCodeChallengeMethod::S256 => s256_challenge(verifier),
        };
        if bool::from(transformed.as_bytes().ct_eq(challenge.as_bytes())) {
            Ok(())
        } else {
            Err(PkceError::Mismatch)
        }
    }

    /// Token-time check for the authorization code grant. Failures are
    /// `invalid_grant`.
    pub fn verify_code_exchange(
        &self,
        client: &Client,
        code: &AuthorizationCode,
        verifier: Option<&str>,
    ) -> Result<(), OAuthError> {
        match (&code.code_challenge, verifier) {
            (Some(challenge), Some(verifier)) => {
                let method = code
                    .code_challenge_method
                    .unwrap_or(OAuthCodeChallengeMethod::Plain);
                self.verify(challenge, method, verifier).map_err(|e| {
                    tracing::warn!(client_id = %client.client_id, error = %e, "PKCE verification failed");
                    OAuthError::InvalidGrantError(e.to_string())
                })
            }
            (Some(_), None) => Err(OAuthError::InvalidGrantError(
                "code_verifier is missing".to_string(),
            )),
            (None, Some(_)) => Err(OAuthError::InvalidGrantError(
                "Unexpected code_verifier".to_string(),
            )),
            (None, None) if client.require_pkce => Err(OAuthError::InvalidGrantError(
                "Client requires PKCE but the code has no code_challenge".to_string(),
            )),
            (None, None) => Ok(()),
        }
    }
}

/// base64url(SHA-256(verifier)) without padding.
pub fn s256_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    fn validator() -> PkceValidator {
        PkceValidator::new(InputLengthRestrictions::default())
    }

    #[test]
    fn test_s256_rfc_vector() {
        assert_eq!(s256_challenge(VERIFIER), CHALLENGE);
        assert!(validator()
            .verify(CHALLENGE, OAuthCodeChallengeMethod::S256, VERIFIER)
            .is_ok());
    }

    #[test]
    fn test_other_verifier_is_invalid_request() {
        let other = "x".repeat(43);
        let error = validator()
            .verify(CHALLENGE, OAuthCodeChallengeMethod::S256, &other)
            .unwrap_err();
        assert_eq!(error, PkceError::Mismatch);
        assert!(matches!(
            OAuthError::from(error),
            OAuthError::InvalidRequestError(_)
        ));
    }

    #[test]
    fn test_verifier_charset_and_length() {
        let validator = validator();
        let bad = format!("{}!", "a".repeat(43));
        assert_eq!(
            validator.verify(&bad, OAuthCodeChallengeMethod::Plain, &bad),
            Err(PkceError::InvalidVerifier)
        );
        assert_eq!(
            validator.verify("short", OAuthCodeChallengeMethod::Plain, "short"),
            Err(PkceError::InvalidVerifier)
        );
    }

    #[test]
    fn test_challenge_rules() {
        let validator = validator();
        let client = Client::new("client");

        assert_eq!(
            validator.validate_challenge(&client, None, None),
            Err(PkceError::MissingChallenge)
        );
        for method in [None, Some("S256"), Some("plain"), Some("bogus")] {
            assert_eq!(
                validator.validate_challenge(&client, Some("short"), method),
                Err(PkceError::InvalidChallengeLength)
            );
        }
        assert_eq!(
            validator.validate_challenge(&client, Some(CHALLENGE), Some("bogus")),
            Err(PkceError::UnsupportedMethod("bogus".to_string()))
        );
        assert_eq!(
            validator.validate_challenge(&client, Some(CHALLENGE), Some("plain")),
            Err(PkceError::PlainNotAllowed)
        );
        let accepted = validator
            .validate_challenge(&client, Some(CHALLENGE), Some("S256"))
            .unwrap()
            .unwrap();
        assert_eq!(accepted.method, OAuthCodeChallengeMethod::S256);
    }

    #[test]
    fn test_challenge_optional_when_not_required() {
        let mut client = Client::new("client");
        client.require_pkce = false;
        assert_eq!(validator().validate_challenge(&client, None, None), Ok(None));
    }
}
