use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::clock::{expires_at, has_expired};
use crate::oauth_provider::token::token::Token;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A stored refresh token. `access_token` is a snapshot of the token it was issued
/// with, used as the template for refreshed access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub creation_time: DateTime<Utc>,
    /// Seconds from `creation_time`
    pub lifetime: u64,
    pub consumed_time: Option<DateTime<Utc>>,
    pub client_id: String,
    pub subject: Subject,
    pub session_id: Option<String>,
    pub authorized_scopes: BTreeSet<String>,
    pub access_token: Token,
    pub description: Option<String>,
}

impl RefreshToken {
    pub fn subject_id(&self) -> &str {
        &self.subject.subject_id
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        expires_at(self.creation_time, self.lifetime)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        has_expired(self.creation_time, self.lifetime, now)
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_time.is_some()
    }
}
