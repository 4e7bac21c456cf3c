use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::clock::{expires_at, Clock};
use crate::oauth_provider::consent::consent::Consent;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::user_consent_store::UserConsentStore;
use crate::oauth_provider::scope::parsed_scope_value::ParsedScopeValue;
use crate::oauth_types::SCOPE_OFFLINE_ACCESS;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct ConsentService {
    store: UserConsentStore,
    clock: Arc<dyn Clock>,
}

impl ConsentService {
    pub fn new(store: UserConsentStore, clock: Arc<dyn Clock>) -> Self {
        ConsentService { store, clock }
    }

    /**
     * Whether the subject must be asked again before `scopes` are granted to the
     * client.
     *
     * Parameterized scopes and `offline_access` always need fresh consent. Otherwise
     * a remembered, unexpired consent covering every requested scope is enough.
     * Expired consents are deleted.
     */
    pub async fn requires_consent(
        &self,
        subject: &Subject,
        client: &Client,
        scopes: &BTreeSet<ParsedScopeValue>,
    ) -> Result<bool, OAuthError> {
        if !client.require_consent {
            return Ok(false);
        }
        if !client.allow_remember_consent {
            tracing::debug!(client_id = %client.client_id, "client does not allow remembering consent");
            return Ok(true);
        }
        if scopes.iter().any(|s| s.is_parameterized()) {
            tracing::debug!(client_id = %client.client_id, "parameterized scopes require consent");
            return Ok(true);
        }
        if scopes.iter().any(|s| s.parsed_name == SCOPE_OFFLINE_ACCESS) {
            tracing::debug!(client_id = %client.client_id, "offline_access requires consent");
            return Ok(true);
        }

        let Some(consent) = self
            .store
            .get_user_consent(&subject.subject_id, &client.client_id)
            .await?
        else {
            tracing::debug!(client_id = %client.client_id, subject_id = %subject.subject_id, "no stored consent");
            return Ok(true);
        };

        if consent.is_expired(self.clock.now()) {
            tracing::debug!(client_id = %client.client_id, subject_id = %subject.subject_id, "stored consent has expired");
            self.store
                .remove_user_consent(&subject.subject_id, &client.client_id)
                .await?;
            return Ok(true);
        }

        let requested: BTreeSet<String> = scopes.iter().map(|s| s.raw_value.clone()).collect();
        if !requested.is_subset(&consent.scopes) {
            tracing::debug!(client_id = %client.client_id, "stored consent does not cover requested scopes");
            return Ok(true);
        }
        Ok(false)
    }

    /// Remember the granted scopes, or forget a previous consent when nothing was
    /// granted.
    pub async fn update_consent(
        &self,
        subject: &Subject,
        client: &Client,
        granted_scopes: &BTreeSet<ParsedScopeValue>,
    ) -> Result<(), OAuthError> {
        if !client.allow_remember_consent {
            return Ok(());
        }
        if granted_scopes.is_empty() {
            tracing::debug!(client_id = %client.client_id, "removing stored consent");
            return self
                .store
                .remove_user_consent(&subject.subject_id, &client.client_id)
                .await;
        }

        let now = self.clock.now();
        let consent = Consent {
            subject_id: subject.subject_id.clone(),
            client_id: client.client_id.clone(),
            scopes: granted_scopes.iter().map(|s| s.raw_value.clone()).collect(),
            creation_time: now,
            expiration: client
                .consent_lifetime
                .map(|lifetime| expires_at(now, lifetime)),
        };
        self.store.store_user_consent(&consent).await
    }
}
