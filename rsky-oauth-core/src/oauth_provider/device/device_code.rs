use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::clock::{expires_at, has_expired};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Authorization state of a device code (RFC 8628).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCodeState {
    /// The user has not decided yet
    #[default]
    Pending,
    Authorized,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCode {
    pub creation_time: DateTime<Utc>,
    /// Seconds
    pub lifetime: u64,
    pub client_id: String,
    pub description: Option<String>,
    pub requested_scopes: BTreeSet<String>,
    /// Scopes the user approved, a subset of `requested_scopes`
    pub authorized_scopes: BTreeSet<String>,
    pub state: DeviceCodeState,
    pub subject: Option<Subject>,
    pub session_id: Option<String>,
}

impl DeviceCode {
    pub fn new(
        client_id: impl Into<String>,
        requested_scopes: BTreeSet<String>,
        creation_time: DateTime<Utc>,
        lifetime: u64,
    ) -> Self {
        Self {
            creation_time,
            lifetime,
            client_id: client_id.into(),
            description: None,
            requested_scopes,
            authorized_scopes: BTreeSet::new(),
            state: DeviceCodeState::Pending,
            subject: None,
            session_id: None,
        }
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        expires_at(self.creation_time, self.lifetime)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        has_expired(self.creation_time, self.lifetime, now)
    }
}
