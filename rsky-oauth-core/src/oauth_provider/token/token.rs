use crate::oauth_provider::account::subject::{
    Claim, CLAIM_CLIENT_ID, CLAIM_JWT_ID, CLAIM_SCOPE, CLAIM_SESSION_ID, CLAIM_SUBJECT,
};
use crate::oauth_provider::client::client::AccessTokenType;
use crate::oauth_provider::clock::{expires_at, has_expired};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "access_token";
pub const TOKEN_TYPE_ID_TOKEN: &str = "id_token";

/// An issued access or identity token before it is serialized. Reference access
/// tokens are stored in this form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub token_type: String,
    pub creation_time: DateTime<Utc>,
    /// Seconds
    pub lifetime: u64,
    pub issuer: String,
    pub audiences: Vec<String>,
    pub client_id: String,
    pub access_token_type: AccessTokenType,
    pub claims: Vec<Claim>,
    pub description: Option<String>,
}

impl Token {
    pub fn new(token_type: &str, client_id: impl Into<String>, creation_time: DateTime<Utc>) -> Self {
        Self {
            token_type: token_type.to_string(),
            creation_time,
            lifetime: 0,
            issuer: String::new(),
            audiences: vec![],
            client_id: client_id.into(),
            access_token_type: AccessTokenType::Jwt,
            claims: vec![],
            description: None,
        }
    }

    fn first_claim(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.first_claim(CLAIM_SUBJECT)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.first_claim(CLAIM_SESSION_ID)
    }

    pub fn jwt_id(&self) -> Option<&str> {
        self.first_claim(CLAIM_JWT_ID)
    }

    pub fn scopes(&self) -> BTreeSet<String> {
        self.claims
            .iter()
            .filter(|c| c.claim_type == CLAIM_SCOPE)
            .map(|c| c.value.clone())
            .collect()
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        expires_at(self.creation_time, self.lifetime)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        has_expired(self.creation_time, self.lifetime, now)
    }

    /// Claims minus the protocol claims the token carries in dedicated fields.
    pub fn user_claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.iter().filter(|c| {
            !matches!(
                c.claim_type.as_str(),
                CLAIM_SUBJECT | CLAIM_CLIENT_ID | CLAIM_SCOPE | CLAIM_JWT_ID
            )
        })
    }
}
