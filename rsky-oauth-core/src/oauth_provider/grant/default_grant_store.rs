use crate::oauth_provider::errors::{OAuthError, StoreError};
use crate::oauth_provider::grant::persisted_grant::{PersistedGrant, PersistedGrantFilter};
use crate::oauth_provider::grant::persisted_grant_store::PersistedGrantStore;
use crate::oauth_provider::handle::hash_key;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Index fields stored next to a serialized grant item.
#[derive(Debug, Clone)]
pub struct GrantMetadata {
    pub client_id: String,
    pub subject_id: Option<String>,
    pub session_id: Option<String>,
    pub description: Option<String>,
    pub creation_time: DateTime<Utc>,
    pub expiration: Option<DateTime<Utc>>,
}

/// Typed view over the persisted grant store for one grant type. Handles are hashed
/// into store keys.
pub struct DefaultGrantStore<T> {
    grant_type: &'static str,
    store: Arc<RwLock<dyn PersistedGrantStore>>,
    _item: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> DefaultGrantStore<T> {
    pub fn new(grant_type: &'static str, store: Arc<RwLock<dyn PersistedGrantStore>>) -> Self {
        DefaultGrantStore {
            grant_type,
            store,
            _item: PhantomData,
        }
    }

    pub fn grant_type(&self) -> &'static str {
        self.grant_type
    }

    pub fn key(&self, handle: &str) -> String {
        hash_key(handle, self.grant_type)
    }

    pub async fn store_item(
        &self,
        handle: &str,
        item: &T,
        metadata: GrantMetadata,
    ) -> Result<(), OAuthError> {
        let data = serde_json::to_string(item).map_err(StoreError::from)?;
        let grant = PersistedGrant {
            key: self.key(handle),
            grant_type: self.grant_type.to_string(),
            subject_id: metadata.subject_id,
            session_id: metadata.session_id,
            client_id: metadata.client_id,
            description: metadata.description,
            creation_time: metadata.creation_time,
            expiration: metadata.expiration,
            consumed_time: None,
            data,
        };
        self.store.write().await.store(grant)
    }

    /// Replace the item under an existing handle, keeping its consumed time.
    pub async fn update_item(
        &self,
        handle: &str,
        item: &T,
        metadata: GrantMetadata,
    ) -> Result<(), OAuthError> {
        let data = serde_json::to_string(item).map_err(StoreError::from)?;
        let key = self.key(handle);
        let mut store = self.store.write().await;
        let consumed_time = store.get(&key)?.and_then(|grant| grant.consumed_time);
        store.store(PersistedGrant {
            key,
            grant_type: self.grant_type.to_string(),
            subject_id: metadata.subject_id,
            session_id: metadata.session_id,
            client_id: metadata.client_id,
            description: metadata.description,
            creation_time: metadata.creation_time,
            expiration: metadata.expiration,
            consumed_time,
            data,
        })
    }

    pub async fn get_item(&self, handle: &str) -> Result<Option<(T, PersistedGrant)>, OAuthError> {
        let grant = self.store.read().await.get(&self.key(handle))?;
        Ok(grant.and_then(|grant| self.decode(grant)))
    }

    pub async fn take_item(&self, handle: &str) -> Result<Option<(T, PersistedGrant)>, OAuthError> {
        let grant = self.store.write().await.take(&self.key(handle))?;
        Ok(grant.and_then(|grant| self.decode(grant)))
    }

    pub async fn remove_item(&self, handle: &str) -> Result<(), OAuthError> {
        self.store.write().await.remove(&self.key(handle))
    }

    pub async fn remove_all_items(&self, subject_id: &str, client_id: &str) -> Result<(), OAuthError> {
        let filter = PersistedGrantFilter::by_subject(subject_id)
            .with_client(client_id)
            .with_grant_type(self.grant_type);
        self.store.write().await.remove_all(&filter)
    }

    pub async fn try_consume_item(&self, handle: &str, at: DateTime<Utc>) -> Result<bool, OAuthError> {
        self.store.write().await.try_consume(&self.key(handle), at)
    }

    fn decode(&self, grant: PersistedGrant) -> Option<(T, PersistedGrant)> {
        if grant.grant_type != self.grant_type {
            return None;
        }
        match serde_json::from_str::<T>(&grant.data) {
            Ok(item) => Some((item, grant)),
            Err(error) => {
                tracing::error!(grant_type = self.grant_type, %error, "failed to deserialize persisted grant");
                None
            }
        }
    }
}
