use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretType {
    /// base64(SHA-256(secret))
    SharedSecret,
    /// Hex thumbprint of the client certificate
    X509Thumbprint,
    /// Public JSON Web Key used to verify client assertions
    JsonWebKey,
}

/// A credential registered for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(rename = "type")]
    pub secret_type: SecretType,
    pub value: String,
    pub description: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

impl Secret {
    /// Register a shared secret; only its hash is kept.
    pub fn shared(plain: &str) -> Self {
        Self::hashed(hash_secret(plain))
    }

    pub fn hashed(hash: impl Into<String>) -> Self {
        Self {
            secret_type: SecretType::SharedSecret,
            value: hash.into(),
            description: None,
            expiration: None,
        }
    }

    pub fn x509_thumbprint(thumbprint: impl Into<String>) -> Self {
        Self {
            secret_type: SecretType::X509Thumbprint,
            value: thumbprint.into(),
            description: None,
            expiration: None,
        }
    }

    pub fn json_web_key(jwk: impl Into<String>) -> Self {
        Self {
            secret_type: SecretType::JsonWebKey,
            value: jwk.into(),
            description: None,
            expiration: None,
        }
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration, Some(expiration) if expiration < now)
    }
}

pub fn hash_secret(plain: &str) -> String {
    STANDARD.encode(Sha256::digest(plain.as_bytes()))
}
