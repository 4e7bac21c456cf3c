use crate::oauth_provider::account::profile_service::ProfileService;
use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::client::client::{Client, TokenExpiration, TokenUsage};
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::refresh_token_store::RefreshTokenStore;
use crate::oauth_provider::token::refresh_token::RefreshToken;
use crate::oauth_provider::token::token::Token;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct RefreshTokenService {
    store: RefreshTokenStore,
    profile: Arc<dyn ProfileService>,
}

impl RefreshTokenService {
    pub fn new(store: RefreshTokenStore, profile: Arc<dyn ProfileService>) -> Self {
        RefreshTokenService { store, profile }
    }

    /**
     * Validate a presented refresh token for the requesting client. Checks run in a
     * fixed order and every failure is `invalid_grant`:
     * not found, expired, other client, offline access revoked, consumed, inactive
     * subject. Expired tokens are deleted.
     */
    pub async fn validate_refresh_token(
        &self,
        handle: &str,
        client: &Client,
        now: DateTime<Utc>,
    ) -> Result<RefreshToken, OAuthError> {
        let Some(token) = self.store.get_refresh_token(handle).await? else {
            tracing::warn!(client_id = %client.client_id, "invalid refresh token");
            return Err(invalid_grant());
        };

        if token.is_expired(now) {
            tracing::warn!(client_id = %client.client_id, "refresh token has expired");
            self.store.remove_refresh_token(handle).await?;
            return Err(invalid_grant());
        }

        if token.client_id != client.client_id {
            tracing::error!(
                client_id = %client.client_id,
                token_client_id = %token.client_id,
                "refresh token was issued to another client"
            );
            return Err(invalid_grant());
        }

        if !client.allow_offline_access {
            tracing::error!(client_id = %client.client_id, "client does not have access to offline_access scope anymore");
            return Err(invalid_grant());
        }

        if token.is_consumed() {
            tracing::warn!(client_id = %client.client_id, "refresh token has already been used");
            return Err(invalid_grant());
        }

        match self.profile.is_active(&token.subject, client).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(subject_id = %token.subject_id(), "profile service returns inactive user for refresh token");
                return Err(invalid_grant());
            }
            Err(error) => {
                tracing::error!(%error, "profile service failed while validating refresh token");
                return Err(invalid_grant());
            }
        }

        Ok(token)
    }

    /// Store a new refresh token for the subject and return its handle.
    pub async fn create_refresh_token(
        &self,
        subject: &Subject,
        session_id: Option<String>,
        access_token: &Token,
        client: &Client,
        now: DateTime<Utc>,
    ) -> Result<String, OAuthError> {
        let lifetime = match client.refresh_token_expiration {
            TokenExpiration::Absolute => client.absolute_refresh_token_lifetime,
            TokenExpiration::Sliding => match client.absolute_refresh_token_lifetime {
                0 => client.sliding_refresh_token_lifetime,
                absolute => client.sliding_refresh_token_lifetime.min(absolute),
            },
        };
        let token = RefreshToken {
            creation_time: now,
            lifetime,
            consumed_time: None,
            client_id: client.client_id.clone(),
            subject: subject.clone(),
            session_id,
            authorized_scopes: access_token.scopes(),
            access_token: access_token.clone(),
            description: None,
        };
        self.store.store_refresh_token(&token).await
    }

    /**
     * Apply the client's usage and expiration policy after a successful refresh and
     * return the handle the client must use next.
     *
     * One-time tokens are consumed and replaced by a new handle with the same
     * creation time. If the token was consumed concurrently this fails with
     * `invalid_grant`. Sliding tokens extend their lifetime to the elapsed time plus
     * the sliding window, never past the absolute lifetime.
     */
    pub async fn update_refresh_token(
        &self,
        handle: &str,
        mut token: RefreshToken,
        client: &Client,
        now: DateTime<Utc>,
    ) -> Result<String, OAuthError> {
        let mut needs_create = false;
        let mut needs_update = false;

        if client.refresh_token_usage == TokenUsage::OneTimeOnly {
            if !self.store.try_consume_refresh_token(handle, now).await? {
                tracing::warn!(client_id = %client.client_id, "refresh token was consumed concurrently");
                return Err(invalid_grant());
            }
            needs_create = true;
        } else {
            // handle is kept, persist the refreshed access token snapshot
            needs_update = true;
        }

        if client.refresh_token_expiration == TokenExpiration::Sliding {
            let elapsed = (now - token.creation_time).num_seconds().max(0) as u64;
            let mut lifetime = elapsed.saturating_add(client.sliding_refresh_token_lifetime);
            if client.absolute_refresh_token_lifetime > 0 {
                lifetime = lifetime.min(client.absolute_refresh_token_lifetime);
            }
            tracing::debug!(lifetime, "extending sliding refresh token lifetime");
            token.lifetime = lifetime;
            needs_update = true;
        }

        if needs_create {
            token.consumed_time = None;
            return self.store.store_refresh_token(&token).await;
        }
        if needs_update {
            self.store.update_refresh_token(handle, &token).await?;
        }
        Ok(handle.to_string())
    }
}

fn invalid_grant() -> OAuthError {
    OAuthError::InvalidGrantError("invalid refresh token".to_string())
}
