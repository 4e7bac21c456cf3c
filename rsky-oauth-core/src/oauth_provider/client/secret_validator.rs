use crate::oauth_provider::client::secret::{hash_secret, Secret, SecretType};
use crate::oauth_provider::client::secret_parser::{Credential, ParsedSecret};
use crate::oauth_provider::replay::replay_manager::ReplayManager;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Checks one kind of presented credential against a client's registered secrets.
/// `secrets` are already filtered to non-expired ones.
#[async_trait::async_trait]
pub trait SecretValidator: Send + Sync {
    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> bool;
}

pub struct HashedSharedSecretValidator;

#[async_trait::async_trait]
impl SecretValidator for HashedSharedSecretValidator {
    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> bool {
        let Credential::SharedSecret(presented) = &parsed.credential else {
            return false;
        };
        let presented = hash_secret(presented);
        let mut matched = false;
        for secret in secrets
            .iter()
            .filter(|s| s.secret_type == SecretType::SharedSecret)
        {
            // check every secret so timing does not reveal which one matched
            matched |= bool::from(presented.as_bytes().ct_eq(secret.value.as_bytes()));
        }
        matched
    }
}

pub struct X509ThumbprintSecretValidator;

#[async_trait::async_trait]
impl SecretValidator for X509ThumbprintSecretValidator {
    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> bool {
        let Credential::X509Thumbprint(presented) = &parsed.credential else {
            return false;
        };
        secrets
            .iter()
            .filter(|s| s.secret_type == SecretType::X509Thumbprint)
            .any(|s| s.value.eq_ignore_ascii_case(presented))
    }
}

#[derive(Debug, Deserialize)]
struct ClientAssertionClaims {
    jti: Option<String>,
}

/// Validates `private_key_jwt` client assertions against the client's JSON Web Keys.
pub struct PrivateKeyJwtSecretValidator {
    /// Accepted `aud` values, the token endpoint and the issuer
    audiences: Vec<String>,
    replay_manager: Arc<ReplayManager>,
}

impl PrivateKeyJwtSecretValidator {
    pub fn new(audiences: Vec<String>, replay_manager: Arc<ReplayManager>) -> Self {
        PrivateKeyJwtSecretValidator {
            audiences,
            replay_manager,
        }
    }

    fn verify_with(&self, secret: &Secret, assertion: &str, client_id: &str) -> Option<String> {
        let header = decode_header(assertion).ok()?;
        let jwk: Jwk = serde_json::from_str(&secret.value).ok()?;
        let key = DecodingKey::from_jwk(&jwk).ok()?;
        let mut validation = Validation::new(header.alg);
        validation.set_audience(&self.audiences);
        validation.set_issuer(&[client_id]);
        validation.sub = Some(client_id.to_string());
        validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);
        let token = decode::<ClientAssertionClaims>(assertion, &key, &validation).ok()?;
        token.claims.jti.filter(|jti| !jti.is_empty())
    }
}

#[async_trait::async_trait]
impl SecretValidator for PrivateKeyJwtSecretValidator {
    async fn validate(&self, secrets: &[Secret], parsed: &ParsedSecret) -> bool {
        let Credential::JwtBearer(assertion) = &parsed.credential else {
            return false;
        };
        let jti = secrets
            .iter()
            .filter(|s| s.secret_type == SecretType::JsonWebKey)
            .find_map(|secret| self.verify_with(secret, assertion, &parsed.client_id));
        match jti {
            Some(jti) => {
                let unique = self
                    .replay_manager
                    .unique_auth(&jti, &parsed.client_id)
                    .await;
                if !unique {
                    tracing::warn!(client_id = %parsed.client_id, "client assertion replayed");
                }
                unique
            }
            None => false,
        }
    }
}
