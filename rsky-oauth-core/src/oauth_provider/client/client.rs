use crate::oauth_provider::account::subject::Claim;
use crate::oauth_provider::client::secret::Secret;
use crate::oauth_provider::constants::{
    ABSOLUTE_REFRESH_TOKEN_LIFETIME, ACCESS_TOKEN_LIFETIME, AUTHORIZATION_CODE_LIFETIME,
    DEFAULT_CLIENT_CLAIMS_PREFIX, DEVICE_CODE_LIFETIME, IDENTITY_TOKEN_LIFETIME,
    SLIDING_REFRESH_TOKEN_LIFETIME,
};
use crate::oauth_types::{OAuthGrantType, PROTOCOL_TYPE_OIDC};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessTokenType {
    /// Self-contained signed token
    #[default]
    Jwt,
    /// Opaque handle, claims kept in the persisted grant store
    Reference,
}

/// What happens to a refresh token handle when it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenUsage {
    /// The handle stays the same on every refresh
    ReUse,
    /// The handle is consumed and a new one is issued on every refresh
    #[default]
    OneTimeOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenExpiration {
    /// Lifetime is extended on each use, never past the absolute lifetime
    Sliding,
    #[default]
    Absolute,
}

/// A registered client. Looked up once per request and treated as immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub client_name: Option<String>,
    pub enabled: bool,
    pub protocol_type: String,
    pub client_secrets: Vec<Secret>,
    pub require_client_secret: bool,
    pub allowed_grant_types: BTreeSet<String>,
    pub allowed_scopes: BTreeSet<String>,
    pub redirect_uris: Vec<String>,

    pub require_pkce: bool,
    pub allow_plain_text_pkce: bool,
    pub allow_offline_access: bool,

    pub require_consent: bool,
    pub allow_remember_consent: bool,
    /// Seconds a remembered consent stays valid, `None` for no expiration
    pub consent_lifetime: Option<u64>,

    pub claims: Vec<Claim>,
    pub always_send_client_claims: bool,
    pub client_claims_prefix: String,
    pub always_include_user_claims_in_id_token: bool,

    pub access_token_type: AccessTokenType,
    pub include_jwt_id: bool,
    pub access_token_lifetime: u64,
    pub identity_token_lifetime: u64,
    pub authorization_code_lifetime: u64,
    pub device_code_lifetime: u64,
    pub absolute_refresh_token_lifetime: u64,
    pub sliding_refresh_token_lifetime: u64,
    pub refresh_token_usage: TokenUsage,
    pub refresh_token_expiration: TokenExpiration,
    pub update_access_token_claims_on_refresh: bool,
}

impl Client {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_name: None,
            enabled: true,
            protocol_type: PROTOCOL_TYPE_OIDC.to_string(),
            client_secrets: vec![],
            require_client_secret: true,
            allowed_grant_types: BTreeSet::new(),
            allowed_scopes: BTreeSet::new(),
            redirect_uris: vec![],
            require_pkce: true,
            allow_plain_text_pkce: false,
            allow_offline_access: false,
            require_consent: false,
            allow_remember_consent: true,
            consent_lifetime: None,
            claims: vec![],
            always_send_client_claims: false,
            client_claims_prefix: DEFAULT_CLIENT_CLAIMS_PREFIX.to_string(),
            always_include_user_claims_in_id_token: false,
            access_token_type: AccessTokenType::Jwt,
            include_jwt_id: true,
            access_token_lifetime: ACCESS_TOKEN_LIFETIME,
            identity_token_lifetime: IDENTITY_TOKEN_LIFETIME,
            authorization_code_lifetime: AUTHORIZATION_CODE_LIFETIME,
            device_code_lifetime: DEVICE_CODE_LIFETIME,
            absolute_refresh_token_lifetime: ABSOLUTE_REFRESH_TOKEN_LIFETIME,
            sliding_refresh_token_lifetime: SLIDING_REFRESH_TOKEN_LIFETIME,
            refresh_token_usage: TokenUsage::OneTimeOnly,
            refresh_token_expiration: TokenExpiration::Absolute,
            update_access_token_claims_on_refresh: false,
        }
    }

    pub fn with_grant_types<I, S>(mut self, grant_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_grant_types
            .extend(grant_types.into_iter().map(Into::into));
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.client_secrets.push(secret);
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uris.push(redirect_uri.into());
        self
    }

    pub fn allows_grant_type(&self, grant_type: &OAuthGrantType) -> bool {
        self.allowed_grant_types.contains(grant_type.as_str())
    }

    pub fn allows_scope(&self, scope_name: &str) -> bool {
        self.allowed_scopes.contains(scope_name)
    }

    /// Client claims with the configured prefix applied.
    pub fn prefixed_claims(&self) -> Vec<Claim> {
        self.claims
            .iter()
            .map(|claim| {
                Claim::new(
                    format!("{}{}", self.client_claims_prefix, claim.claim_type),
                    claim.value.clone(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let client = Client::new("client");
        assert!(client.enabled);
        assert!(client.require_client_secret);
        assert!(client.require_pkce);
        assert!(!client.allow_offline_access);
        assert_eq!(client.protocol_type, "oidc");
        assert_eq!(client.refresh_token_usage, TokenUsage::OneTimeOnly);
        assert_eq!(client.refresh_token_expiration, TokenExpiration::Absolute);
    }

    #[test]
    fn test_allows_grant_type() {
        let client = Client::new("client").with_grant_types(["client_credentials"]);
        assert!(client.allows_grant_type(&OAuthGrantType::ClientCredentials));
        assert!(!client.allows_grant_type(&OAuthGrantType::Password));
    }

    #[test]
    fn test_prefixed_claims() {
        let mut client = Client::new("client");
        client.claims.push(Claim::new("tenant", "acme"));
        assert_eq!(
            client.prefixed_claims(),
            vec![Claim::new("client_tenant", "acme")]
        );
    }
}
