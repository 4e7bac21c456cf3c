use crate::oauth_provider::constants::{CODE_PREFIX, GRANT_TYPE_AUTHORIZATION_CODE};
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::default_grant_store::{DefaultGrantStore, GrantMetadata};
use crate::oauth_provider::grant::persisted_grant_store::PersistedGrantStore;
use crate::oauth_provider::handle::generate_handle;
use crate::oauth_provider::request::authorization_code::AuthorizationCode;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AuthorizationCodeStore {
    inner: DefaultGrantStore<AuthorizationCode>,
}

impl AuthorizationCodeStore {
    pub fn new(store: Arc<RwLock<dyn PersistedGrantStore>>) -> Self {
        AuthorizationCodeStore {
            inner: DefaultGrantStore::new(GRANT_TYPE_AUTHORIZATION_CODE, store),
        }
    }

    /// Store the code and return its handle.
    pub async fn store_authorization_code(&self, code: &AuthorizationCode) -> Result<String, OAuthError> {
        let handle = generate_handle(CODE_PREFIX);
        self.inner
            .store_item(
                &handle,
                code,
                GrantMetadata {
                    client_id: code.client_id.clone(),
                    subject_id: Some(code.subject.subject_id.clone()),
                    session_id: code.session_id.clone(),
                    description: code.description.clone(),
                    creation_time: code.creation_time,
                    expiration: Some(code.expiration()),
                },
            )
            .await?;
        Ok(handle)
    }

    pub async fn get_authorization_code(&self, handle: &str) -> Result<Option<AuthorizationCode>, OAuthError> {
        Ok(self.inner.get_item(handle).await?.map(|(code, _)| code))
    }

    /// Remove the code and return it. Of two concurrent callers at most one gets it.
    pub async fn take_authorization_code(&self, handle: &str) -> Result<Option<AuthorizationCode>, OAuthError> {
        Ok(self.inner.take_item(handle).await?.map(|(code, _)| code))
    }

    pub async fn remove_authorization_code(&self, handle: &str) -> Result<(), OAuthError> {
        self.inner.remove_item(handle).await
    }
}
