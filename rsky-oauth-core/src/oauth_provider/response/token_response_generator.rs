use crate::oauth_provider::account::subject::{Claim, CLAIM_JWT_ID};
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::token::refresh_token_service::RefreshTokenService;
use crate::oauth_provider::token::token::Token;
use crate::oauth_provider::token::token_service::{TokenCreationRequest, TokenService};
use crate::oauth_provider::validation::validated_request::ValidatedTokenRequest;
use crate::oauth_types::{OAuthGrantType, OAuthTokenResponse, SCOPE_OPENID};
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::sync::Arc;

/// Turns a validated token request into the token endpoint response.
pub struct TokenResponseGenerator {
    tokens: Arc<TokenService>,
    refresh_tokens: Arc<RefreshTokenService>,
}

struct IssuedAccessToken {
    token: Token,
    serialized: String,
}

impl TokenResponseGenerator {
    pub fn new(tokens: Arc<TokenService>, refresh_tokens: Arc<RefreshTokenService>) -> Self {
        TokenResponseGenerator {
            tokens,
            refresh_tokens,
        }
    }

    #[tracing::instrument(skip_all, fields(client_id = %request.client.client_id, grant_type = %request.grant_type))]
    pub async fn process(
        &self,
        request: &ValidatedTokenRequest,
    ) -> Result<OAuthTokenResponse, OAuthError> {
        let response = match &request.grant_type {
            OAuthGrantType::RefreshToken => self.process_refresh_token_request(request).await?,
            OAuthGrantType::AuthorizationCode | OAuthGrantType::DeviceCode => {
                self.process_interactive_request(request).await?
            }
            _ => {
                let issued = self.create_access_token(request, request.request_time).await?;
                let refresh_token = self.create_refresh_token(request, &issued.token).await?;
                self.response(request, issued, refresh_token, None)
            }
        };
        Ok(response.with_custom(request.custom_response.clone()))
    }

    /// Authorization code and device code: the user took part, so an identity token
    /// is issued when `openid` was granted.
    async fn process_interactive_request(
        &self,
        request: &ValidatedTokenRequest,
    ) -> Result<OAuthTokenResponse, OAuthError> {
        let now = request.request_time;
        let issued = self.create_access_token(request, now).await?;
        let refresh_token = self.create_refresh_token(request, &issued.token).await?;

        let id_token = if request.validated_resources.contains_scope(SCOPE_OPENID) {
            let nonce = request
                .authorization_code
                .as_ref()
                .and_then(|code| code.nonce.as_deref());
            let token = self
                .tokens
                .create_identity_token(
                    TokenCreationRequest {
                        nonce,
                        access_token_to_hash: Some(issued.serialized.as_str()),
                        ..self.creation_request(request)
                    },
                    now,
                )
                .await?;
            Some(self.tokens.create_security_token(&token).await?)
        } else {
            None
        };

        Ok(self.response(request, issued, refresh_token, id_token))
    }

    /**
     * Refresh grant: issue a new access token and apply the client's refresh token
     * usage and expiration policy.
     *
     * Claims are fetched again when the client asks for it or when the scope was
     * narrowed. Otherwise the stored access token snapshot is reissued with a new
     * creation time and id.
     */
    async fn process_refresh_token_request(
        &self,
        request: &ValidatedTokenRequest,
    ) -> Result<OAuthTokenResponse, OAuthError> {
        let now = request.request_time;
        let (Some(handle), Some(refresh_token)) =
            (&request.refresh_token_handle, &request.refresh_token)
        else {
            return Err(OAuthError::RuntimeError(
                "Refresh token missing from validated request".to_string(),
            ));
        };
        let client = &request.client;

        let narrowed = request.validated_resources.raw_scope_values() != refresh_token.authorized_scopes;
        let access_token = if client.update_access_token_claims_on_refresh || narrowed {
            self.tokens
                .create_access_token(self.creation_request(request), now)
                .await?
        } else {
            let mut token = refresh_token.access_token.clone();
            token.creation_time = now;
            token.lifetime = client.access_token_lifetime;
            token.access_token_type = client.access_token_type;
            if client.include_jwt_id {
                token.claims.retain(|c| c.claim_type != CLAIM_JWT_ID);
                let mut jti = [0u8; 16];
                rand::thread_rng().fill_bytes(&mut jti);
                token.claims.push(Claim::new(CLAIM_JWT_ID, hex::encode(jti)));
            }
            token
        };
        let mut updated = refresh_token.clone();
        if client.update_access_token_claims_on_refresh {
            updated.access_token = access_token.clone();
        }
        // consume the refresh token before anything is persisted for the new access token
        let new_handle = self
            .refresh_tokens
            .update_refresh_token(handle, updated, client, now)
            .await?;
        let serialized = self.tokens.create_security_token(&access_token).await?;

        let id_token = if request.validated_resources.contains_scope(SCOPE_OPENID) {
            let token = self
                .tokens
                .create_identity_token(
                    TokenCreationRequest {
                        access_token_to_hash: Some(serialized.as_str()),
                        ..self.creation_request(request)
                    },
                    now,
                )
                .await?;
            Some(self.tokens.create_security_token(&token).await?)
        } else {
            None
        };

        let issued = IssuedAccessToken {
            token: access_token,
            serialized,
        };
        Ok(self.response(request, issued, Some(new_handle), id_token))
    }

    fn creation_request<'a>(&self, request: &'a ValidatedTokenRequest) -> TokenCreationRequest<'a> {
        TokenCreationRequest {
            client: &request.client,
            subject: request.subject.as_ref(),
            session_id: request.session_id.as_deref(),
            resources: &request.validated_resources,
            nonce: None,
            access_token_to_hash: None,
        }
    }

    async fn create_access_token(
        &self,
        request: &ValidatedTokenRequest,
        now: DateTime<Utc>,
    ) -> Result<IssuedAccessToken, OAuthError> {
        let token = self
            .tokens
            .create_access_token(self.creation_request(request), now)
            .await?;
        let serialized = self.tokens.create_security_token(&token).await?;
        Ok(IssuedAccessToken { token, serialized })
    }

    /// A refresh token is only issued for a subject that was granted
    /// `offline_access`.
    async fn create_refresh_token(
        &self,
        request: &ValidatedTokenRequest,
        access_token: &Token,
    ) -> Result<Option<String>, OAuthError> {
        let Some(subject) = &request.subject else {
            return Ok(None);
        };
        if !request.validated_resources.resources.offline_access {
            return Ok(None);
        }
        let handle = self
            .refresh_tokens
            .create_refresh_token(
                subject,
                request.session_id.clone(),
                access_token,
                &request.client,
                request.request_time,
            )
            .await?;
        Ok(Some(handle))
    }

    fn response(
        &self,
        request: &ValidatedTokenRequest,
        access_token: IssuedAccessToken,
        refresh_token: Option<String>,
        id_token: Option<String>,
    ) -> OAuthTokenResponse {
        let scope = request.validated_resources.scope_string();
        OAuthTokenResponse::new(access_token.serialized, access_token.token.lifetime)
            .with_scope((!scope.is_empty()).then_some(scope))
            .with_refresh_token(refresh_token)
            .with_id_token(id_token)
    }
}
