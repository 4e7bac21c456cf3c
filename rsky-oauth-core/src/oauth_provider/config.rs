//! Provider options, passed explicitly into every validator and service.

use crate::oauth_provider::constants::{
    DEVICE_FLOW_INTERVAL, PKCE_MAX_LENGTH, PKCE_MIN_LENGTH, USER_CODE_LENGTH,
};
use crate::oauth_provider::errors::OAuthError;
use std::env;
use std::str::FromStr;

/// Upper bounds for raw request parameters, checked before any store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLengthRestrictions {
    pub client_id: usize,
    pub client_secret: usize,
    pub grant_type: usize,
    pub scope: usize,
    pub user_name: usize,
    pub password: usize,
    pub authorization_code: usize,
    pub refresh_token: usize,
    pub device_code: usize,
    pub token_handle: usize,
    pub jwt: usize,
    pub code_challenge_min_length: usize,
    pub code_challenge_max_length: usize,
    pub code_verifier_min_length: usize,
    pub code_verifier_max_length: usize,
}

impl Default for InputLengthRestrictions {
    fn default() -> Self {
        Self {
            client_id: 100,
            client_secret: 100,
            grant_type: 100,
            scope: 300,
            user_name: 100,
            password: 100,
            authorization_code: 100,
            refresh_token: 100,
            device_code: 100,
            token_handle: 100,
            jwt: 51200,
            code_challenge_min_length: PKCE_MIN_LENGTH,
            code_challenge_max_length: PKCE_MAX_LENGTH,
            code_verifier_min_length: PKCE_MIN_LENGTH,
            code_verifier_max_length: PKCE_MAX_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFlowOptions {
    /// Minimum seconds between two polls of one device code
    pub interval: u64,
    pub verification_uri: String,
    pub user_code_length: usize,
}

impl Default for DeviceFlowOptions {
    fn default() -> Self {
        Self {
            interval: DEVICE_FLOW_INTERVAL,
            verification_uri: "https://localhost/device".to_string(),
            user_code_length: USER_CODE_LENGTH,
        }
    }
}

/// HMAC secret used to sign JWT access and identity tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningOptions {
    pub secret: Vec<u8>,
    pub key_id: Option<String>,
}

impl std::fmt::Debug for SigningOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningOptions")
            .field("secret", &"<redacted>")
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl Default for SigningOptions {
    fn default() -> Self {
        Self {
            secret: b"development-signing-secret-change-me".to_vec(),
            key_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Issuer identifier, used as `iss` and as the token endpoint audience prefix
    pub issuer_uri: String,
    pub token_endpoint: String,
    pub input_length_restrictions: InputLengthRestrictions,
    pub device_flow: DeviceFlowOptions,
    pub signing: SigningOptions,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        let issuer_uri = "https://localhost".to_string();
        Self {
            token_endpoint: format!("{issuer_uri}/connect/token"),
            issuer_uri,
            input_length_restrictions: InputLengthRestrictions::default(),
            device_flow: DeviceFlowOptions::default(),
            signing: SigningOptions::default(),
        }
    }
}

impl ProviderOptions {
    /// Load options from `OAUTH_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, OAuthError> {
        let mut options = ProviderOptions::default();
        if let Ok(issuer) = env::var("OAUTH_ISSUER") {
            let issuer = issuer.trim_end_matches('/').to_string();
            options.token_endpoint = format!("{issuer}/connect/token");
            options.issuer_uri = issuer;
        }
        if let Ok(token_endpoint) = env::var("OAUTH_TOKEN_ENDPOINT") {
            options.token_endpoint = token_endpoint;
        }
        if let Some(interval) = env_parse::<u64>("OAUTH_DEVICE_FLOW_INTERVAL")? {
            options.device_flow.interval = interval;
        }
        if let Ok(uri) = env::var("OAUTH_DEVICE_VERIFICATION_URI") {
            options.device_flow.verification_uri = uri;
        }
        if let Some(length) = env_parse::<usize>("OAUTH_USER_CODE_LENGTH")? {
            options.device_flow.user_code_length = length;
        }
        if let Ok(secret) = env::var("OAUTH_SIGNING_SECRET") {
            options.signing.secret = secret.into_bytes();
        }
        options.signing.key_id = env::var("OAUTH_SIGNING_KEY_ID").ok();
        if let Some(max) = env_parse::<usize>("OAUTH_MAX_SCOPE_LENGTH")? {
            options.input_length_restrictions.scope = max;
        }
        Ok(options)
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>, OAuthError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| OAuthError::RuntimeError(format!("{name} has an invalid value"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ProviderOptions::default();
        assert_eq!(options.input_length_restrictions.grant_type, 100);
        assert_eq!(options.input_length_restrictions.code_challenge_min_length, 43);
        assert_eq!(options.input_length_restrictions.code_challenge_max_length, 128);
        assert_eq!(options.device_flow.interval, 5);
        assert_eq!(options.token_endpoint, "https://localhost/connect/token");
    }

    #[test]
    fn test_signing_secret_is_redacted() {
        let rendered = format!("{:?}", SigningOptions::default());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("development"));
    }
}
