use crate::oauth_provider::constants::{GRANT_TYPE_REFERENCE_TOKEN, TOKEN_ID_PREFIX};
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::default_grant_store::{DefaultGrantStore, GrantMetadata};
use crate::oauth_provider::grant::persisted_grant_store::PersistedGrantStore;
use crate::oauth_provider::handle::generate_handle;
use crate::oauth_provider::token::token::Token;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct ReferenceTokenStore {
    inner: DefaultGrantStore<Token>,
}

impl ReferenceTokenStore {
    pub fn new(store: Arc<RwLock<dyn PersistedGrantStore>>) -> Self {
        ReferenceTokenStore {
            inner: DefaultGrantStore::new(GRANT_TYPE_REFERENCE_TOKEN, store),
        }
    }

    pub async fn store_reference_token(&self, token: &Token) -> Result<String, OAuthError> {
        let handle = generate_handle(TOKEN_ID_PREFIX);
        self.inner
            .store_item(
                &handle,
                token,
                GrantMetadata {
                    client_id: token.client_id.clone(),
                    subject_id: token.subject_id().map(str::to_string),
                    session_id: token.session_id().map(str::to_string),
                    description: token.description.clone(),
                    creation_time: token.creation_time,
                    expiration: Some(token.expiration()),
                },
            )
            .await?;
        Ok(handle)
    }

    pub async fn get_reference_token(&self, handle: &str) -> Result<Option<Token>, OAuthError> {
        Ok(self.inner.get_item(handle).await?.map(|(token, _)| token))
    }

    pub async fn remove_reference_token(&self, handle: &str) -> Result<(), OAuthError> {
        self.inner.remove_item(handle).await
    }

    pub async fn remove_reference_tokens(&self, subject_id: &str, client_id: &str) -> Result<(), OAuthError> {
        self.inner.remove_all_items(subject_id, client_id).await
    }
}
