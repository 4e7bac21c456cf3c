use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::oauth_types::OAuthTokenType;

/// Success response from a token endpoint.
///
/// See RFC 6749 section 5.1 and OpenID Connect Core for response details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokenResponse {
    /// The access token string
    pub access_token: String,

    /// Type of access token issued
    pub token_type: OAuthTokenType,

    /// Access token lifetime in seconds
    pub expires_in: u64,

    /// Granted scopes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Refresh token that can be used to obtain new access tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID Token for OpenID Connect flows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Fields contributed by extension grant validators
    #[serde(flatten)]
    pub custom: BTreeMap<String, serde_json::Value>,
}

impl OAuthTokenResponse {
    /// Create a new token response with the required fields.
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: OAuthTokenType::Bearer,
            expires_in,
            scope: None,
            refresh_token: None,
            id_token: None,
            custom: BTreeMap::new(),
        }
    }

    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    pub fn with_id_token(mut self, id_token: Option<String>) -> Self {
        self.id_token = id_token;
        self
    }

    pub fn with_custom(mut self, custom: BTreeMap<String, serde_json::Value>) -> Self {
        self.custom.extend(custom);
        self
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub fn has_id_token(&self) -> bool {
        self.id_token.is_some()
    }
}
