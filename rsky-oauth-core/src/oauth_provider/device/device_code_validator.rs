use crate::oauth_provider::account::profile_service::ProfileService;
use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::device::device_code::{DeviceCode, DeviceCodeState};
use crate::oauth_provider::device::device_flow_store::DeviceFlowStore;
use crate::oauth_provider::device::device_flow_throttling::DeviceFlowThrottlingService;
use crate::oauth_provider::errors::OAuthError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Answers one poll of the device authorization grant.
pub struct DeviceCodeValidator {
    store: Arc<RwLock<dyn DeviceFlowStore>>,
    throttling: Arc<RwLock<dyn DeviceFlowThrottlingService>>,
    profile: Arc<dyn ProfileService>,
}

impl DeviceCodeValidator {
    pub fn new(
        store: Arc<RwLock<dyn DeviceFlowStore>>,
        throttling: Arc<RwLock<dyn DeviceFlowThrottlingService>>,
        profile: Arc<dyn ProfileService>,
    ) -> Self {
        DeviceCodeValidator {
            store,
            throttling,
            profile,
        }
    }

    /**
     * Validate a polled device code for the requesting client.
     *
     * An authorized code is removed from the store before it is returned, so it can
     * be redeemed once. Expired codes are removed as well.
     */
    pub async fn validate(
        &self,
        device_code: &str,
        client: &Client,
        now: DateTime<Utc>,
    ) -> Result<DeviceCode, OAuthError> {
        let Some(details) = self.store.read().await.find_by_device_code(device_code)? else {
            tracing::warn!(client_id = %client.client_id, "invalid device code");
            return Err(OAuthError::InvalidGrantError("Invalid device code".to_string()));
        };

        if details.client_id != client.client_id {
            tracing::error!(
                client_id = %client.client_id,
                code_client_id = %details.client_id,
                "device code was issued to another client"
            );
            return Err(OAuthError::InvalidGrantError("Invalid device code".to_string()));
        }

        if details.is_expired(now) {
            tracing::warn!(client_id = %client.client_id, "device code has expired");
            self.store.write().await.remove_by_device_code(device_code)?;
            return Err(OAuthError::ExpiredTokenError(
                "Device code has expired".to_string(),
            ));
        }

        if self
            .throttling
            .write()
            .await
            .should_slow_down(device_code, &details, now)
        {
            tracing::debug!(client_id = %client.client_id, "device code polled too often");
            return Err(OAuthError::SlowDownError);
        }

        match details.state {
            DeviceCodeState::Pending => {
                tracing::debug!(client_id = %client.client_id, "device authorization is pending");
                return Err(OAuthError::AuthorizationPendingError);
            }
            DeviceCodeState::Denied => {
                tracing::warn!(client_id = %client.client_id, "user denied the device authorization");
                return Err(OAuthError::AccessDeniedError(
                    "User denied the request".to_string(),
                ));
            }
            DeviceCodeState::Authorized => {}
        }

        let Some(subject) = details.subject.as_ref() else {
            tracing::error!(client_id = %client.client_id, "authorized device code has no subject");
            return Err(OAuthError::InvalidGrantError("Invalid device code".to_string()));
        };
        match self.profile.is_active(subject, client).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(subject_id = %subject.subject_id, "profile service returns inactive user for device code");
                return Err(OAuthError::InvalidGrantError("User is inactive".to_string()));
            }
            Err(error) => {
                tracing::error!(%error, "profile service failed while validating device code");
                return Err(OAuthError::InvalidGrantError("User is inactive".to_string()));
            }
        }

        // concurrent pollers race here, only one gets the record
        match self.store.write().await.remove_by_device_code(device_code)? {
            Some(details) => Ok(details),
            None => {
                tracing::warn!(client_id = %client.client_id, "device code was redeemed concurrently");
                Err(OAuthError::InvalidGrantError("Invalid device code".to_string()))
            }
        }
    }
}
