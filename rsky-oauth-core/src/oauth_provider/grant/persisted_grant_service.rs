use crate::oauth_provider::consent::consent::Consent;
use crate::oauth_provider::constants::{
    GRANT_TYPE_AUTHORIZATION_CODE, GRANT_TYPE_REFERENCE_TOKEN, GRANT_TYPE_REFRESH_TOKEN,
    GRANT_TYPE_USER_CONSENT,
};
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::persisted_grant::{PersistedGrant, PersistedGrantFilter};
use crate::oauth_provider::grant::persisted_grant_store::PersistedGrantStore;
use crate::oauth_provider::request::authorization_code::AuthorizationCode;
use crate::oauth_provider::token::refresh_token::RefreshToken;
use crate::oauth_provider::token::token::Token;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything a subject has granted one client, merged across consents, codes and
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub subject_id: String,
    pub client_id: String,
    pub description: Option<String>,
    pub scopes: BTreeSet<String>,
    pub creation_time: DateTime<Utc>,
    /// `None` when any merged record never expires
    pub expiration: Option<DateTime<Utc>>,
}

impl Grant {
    fn merge(&mut self, other: Grant) {
        self.scopes.extend(other.scopes);
        if other.creation_time < self.creation_time {
            self.creation_time = other.creation_time;
        }
        self.expiration = match (self.expiration, other.expiration) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        if self.description.is_none() {
            self.description = other.description;
        }
    }
}

pub struct PersistedGrantService {
    store: Arc<RwLock<dyn PersistedGrantStore>>,
}

impl PersistedGrantService {
    pub fn new(store: Arc<RwLock<dyn PersistedGrantStore>>) -> Self {
        PersistedGrantService { store }
    }

    /// One `Grant` per client the subject has granted access to.
    pub async fn get_all_grants(&self, subject_id: &str) -> Result<Vec<Grant>, OAuthError> {
        let grants = self
            .store
            .read()
            .await
            .get_all(&PersistedGrantFilter::by_subject(subject_id))?;

        let mut merged: BTreeMap<String, Grant> = BTreeMap::new();
        for grant in grants {
            let Some(scopes) = scopes_of(&grant) else {
                continue;
            };
            let view = Grant {
                subject_id: subject_id.to_string(),
                client_id: grant.client_id.clone(),
                description: grant.description.clone(),
                scopes,
                creation_time: grant.creation_time,
                expiration: grant.expiration,
            };
            match merged.get_mut(&grant.client_id) {
                Some(existing) => existing.merge(view),
                None => {
                    merged.insert(grant.client_id.clone(), view);
                }
            }
        }
        Ok(merged.into_values().collect())
    }

    /// Remove every grant of the subject, optionally limited to one client or session.
    pub async fn remove_all_grants(
        &self,
        subject_id: &str,
        client_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<(), OAuthError> {
        let filter = PersistedGrantFilter {
            subject_id: Some(subject_id.to_string()),
            client_id: client_id.map(str::to_string),
            session_id: session_id.map(str::to_string),
            grant_type: None,
        };
        self.store.write().await.remove_all(&filter)
    }
}

/// Scopes carried by a persisted grant, or `None` when it should not be shown.
fn scopes_of(grant: &PersistedGrant) -> Option<BTreeSet<String>> {
    match grant.grant_type.as_str() {
        GRANT_TYPE_USER_CONSENT => decode::<Consent>(grant).map(|c| c.scopes),
        GRANT_TYPE_AUTHORIZATION_CODE => {
            decode::<AuthorizationCode>(grant).map(|c| c.requested_scopes)
        }
        GRANT_TYPE_REFRESH_TOKEN => {
            if grant.consumed_time.is_some() {
                return None;
            }
            decode::<RefreshToken>(grant)
                .filter(|t| !t.is_consumed())
                .map(|t| t.authorized_scopes)
        }
        GRANT_TYPE_REFERENCE_TOKEN => decode::<Token>(grant).map(|t| t.scopes()),
        _ => None,
    }
}

fn decode<T: DeserializeOwned>(grant: &PersistedGrant) -> Option<T> {
    match serde_json::from_str(&grant.data) {
        Ok(item) => Some(item),
        Err(error) => {
            tracing::error!(grant_type = %grant.grant_type, %error, "failed to deserialize persisted grant");
            None
        }
    }
}
