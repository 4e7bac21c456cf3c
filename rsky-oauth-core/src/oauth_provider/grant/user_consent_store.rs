use crate::oauth_provider::consent::consent::Consent;
use crate::oauth_provider::constants::GRANT_TYPE_USER_CONSENT;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::default_grant_store::{DefaultGrantStore, GrantMetadata};
use crate::oauth_provider::grant::persisted_grant_store::PersistedGrantStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consents are keyed by client and subject, so storing one replaces the previous.
pub struct UserConsentStore {
    inner: DefaultGrantStore<Consent>,
}

fn consent_handle(subject_id: &str, client_id: &str) -> String {
    format!("{client_id}|{subject_id}")
}

impl UserConsentStore {
    pub fn new(store: Arc<RwLock<dyn PersistedGrantStore>>) -> Self {
        UserConsentStore {
            inner: DefaultGrantStore::new(GRANT_TYPE_USER_CONSENT, store),
        }
    }

    pub async fn store_user_consent(&self, consent: &Consent) -> Result<(), OAuthError> {
        let handle = consent_handle(&consent.subject_id, &consent.client_id);
        self.inner
            .store_item(
                &handle,
                consent,
                GrantMetadata {
                    client_id: consent.client_id.clone(),
                    subject_id: Some(consent.subject_id.clone()),
                    session_id: None,
                    description: None,
                    creation_time: consent.creation_time,
                    expiration: consent.expiration,
                },
            )
            .await
    }

    pub async fn get_user_consent(&self, subject_id: &str, client_id: &str) -> Result<Option<Consent>, OAuthError> {
        let handle = consent_handle(subject_id, client_id);
        Ok(self.inner.get_item(&handle).await?.map(|(consent, _)| consent))
    }

    pub async fn remove_user_consent(&self, subject_id: &str, client_id: &str) -> Result<(), OAuthError> {
        self.inner
            .remove_item(&consent_handle(subject_id, client_id))
            .await
    }
}
