use crate::oauth_provider::constants::{GRANT_TYPE_REFRESH_TOKEN, REFRESH_TOKEN_PREFIX};
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::default_grant_store::{DefaultGrantStore, GrantMetadata};
use crate::oauth_provider::grant::persisted_grant_store::PersistedGrantStore;
use crate::oauth_provider::handle::generate_handle;
use crate::oauth_provider::token::refresh_token::RefreshToken;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct RefreshTokenStore {
    inner: DefaultGrantStore<RefreshToken>,
}

fn metadata(token: &RefreshToken) -> GrantMetadata {
    GrantMetadata {
        client_id: token.client_id.clone(),
        subject_id: Some(token.subject_id().to_string()),
        session_id: token.session_id.clone(),
        description: token.description.clone(),
        creation_time: token.creation_time,
        expiration: Some(token.expiration()),
    }
}

impl RefreshTokenStore {
    pub fn new(store: Arc<RwLock<dyn PersistedGrantStore>>) -> Self {
        RefreshTokenStore {
            inner: DefaultGrantStore::new(GRANT_TYPE_REFRESH_TOKEN, store),
        }
    }

    pub async fn store_refresh_token(&self, token: &RefreshToken) -> Result<String, OAuthError> {
        let handle = generate_handle(REFRESH_TOKEN_PREFIX);
        self.inner
            .store_item(&handle, token, metadata(token))
            .await?;
        Ok(handle)
    }

    pub async fn update_refresh_token(&self, handle: &str, token: &RefreshToken) -> Result<(), OAuthError> {
        self.inner
            .update_item(handle, token, metadata(token))
            .await
    }

    /// The token with its consumed time as recorded by the store.
    pub async fn get_refresh_token(&self, handle: &str) -> Result<Option<RefreshToken>, OAuthError> {
        Ok(self.inner.get_item(handle).await?.map(|(mut token, grant)| {
            token.consumed_time = token.consumed_time.or(grant.consumed_time);
            token
        }))
    }

    /// Mark the token consumed. Returns false if another caller got there first.
    pub async fn try_consume_refresh_token(&self, handle: &str, at: DateTime<Utc>) -> Result<bool, OAuthError> {
        self.inner.try_consume_item(handle, at).await
    }

    pub async fn remove_refresh_token(&self, handle: &str) -> Result<(), OAuthError> {
        self.inner.remove_item(handle).await
    }

    pub async fn remove_refresh_tokens(&self, subject_id: &str, client_id: &str) -> Result<(), OAuthError> {
        self.inner.remove_all_items(subject_id, client_id).await
    }
}
