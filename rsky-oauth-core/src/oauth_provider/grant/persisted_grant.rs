use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored grant artifact: authorization code, refresh token, reference token or
/// consent. `data` holds the serialized artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedGrant {
    pub key: String,
    #[serde(rename = "type")]
    pub grant_type: String,
    pub subject_id: Option<String>,
    pub session_id: Option<String>,
    pub client_id: String,
    pub description: Option<String>,
    pub creation_time: DateTime<Utc>,
    pub expiration: Option<DateTime<Utc>>,
    pub consumed_time: Option<DateTime<Utc>>,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedGrantFilter {
    pub subject_id: Option<String>,
    pub session_id: Option<String>,
    pub client_id: Option<String>,
    pub grant_type: Option<String>,
}

impl PersistedGrantFilter {
    pub fn by_subject(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            ..Default::default()
        }
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = Some(grant_type.into());
        self
    }

    /// A filter must narrow by at least one field.
    pub fn is_empty(&self) -> bool {
        self.subject_id.is_none()
            && self.session_id.is_none()
            && self.client_id.is_none()
            && self.grant_type.is_none()
    }

    pub fn matches(&self, grant: &PersistedGrant) -> bool {
        fn eq(filter: &Option<String>, value: Option<&str>) -> bool {
            match filter {
                Some(expected) => value == Some(expected.as_str()),
                None => true,
            }
        }
        eq(&self.subject_id, grant.subject_id.as_deref())
            && eq(&self.session_id, grant.session_id.as_deref())
            && eq(&self.client_id, Some(grant.client_id.as_str()))
            && eq(&self.grant_type, Some(grant.grant_type.as_str()))
    }
}
