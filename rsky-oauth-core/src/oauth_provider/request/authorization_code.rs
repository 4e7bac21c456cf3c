use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::clock::{expires_at, has_expired};
use crate::oauth_types::{OAuthCodeChallengeMethod, SCOPE_OPENID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// State captured at authorization time and redeemed once at the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub creation_time: DateTime<Utc>,
    /// Seconds
    pub lifetime: u64,
    pub client_id: String,
    pub subject: Subject,
    pub session_id: Option<String>,
    pub requested_scopes: BTreeSet<String>,
    pub redirect_uri: String,
    pub nonce: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<OAuthCodeChallengeMethod>,
    pub description: Option<String>,
}

impl AuthorizationCode {
    pub fn new(
        client_id: impl Into<String>,
        subject: Subject,
        redirect_uri: impl Into<String>,
        requested_scopes: BTreeSet<String>,
        creation_time: DateTime<Utc>,
        lifetime: u64,
    ) -> Self {
        Self {
            creation_time,
            lifetime,
            client_id: client_id.into(),
            subject,
            session_id: None,
            requested_scopes,
            redirect_uri: redirect_uri.into(),
            nonce: None,
            code_challenge: None,
            code_challenge_method: None,
            description: None,
        }
    }

    pub fn with_pkce(mut self, challenge: impl Into<String>, method: OAuthCodeChallengeMethod) -> Self {
        self.code_challenge = Some(challenge.into());
        self.code_challenge_method = Some(method);
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn is_open_id(&self) -> bool {
        self.requested_scopes.contains(SCOPE_OPENID)
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        expires_at(self.creation_time, self.lifetime)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        has_expired(self.creation_time, self.lifetime, now)
    }
}
