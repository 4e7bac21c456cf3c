use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::client::client_store::{find_enabled_client, ClientStore};
use crate::oauth_provider::clock::Clock;
use crate::oauth_provider::config::InputLengthRestrictions;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::reference_token_store::ReferenceTokenStore;
use crate::oauth_provider::token::signer::Signer;
use crate::oauth_provider::token::token::{Token, TOKEN_TYPE_ACCESS_TOKEN};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct TokenValidationResult {
    pub token: Token,
    pub client: Client,
    /// Set when the token was a reference handle
    pub reference_token_handle: Option<String>,
}

/// Validates access tokens presented to the userinfo, introspection and revocation
/// endpoints.
pub struct TokenValidator {
    signer: Arc<Signer>,
    reference_tokens: ReferenceTokenStore,
    clients: Arc<RwLock<dyn ClientStore>>,
    clock: Arc<dyn Clock>,
    limits: InputLengthRestrictions,
}

impl TokenValidator {
    pub fn new(
        signer: Arc<Signer>,
        reference_tokens: ReferenceTokenStore,
        clients: Arc<RwLock<dyn ClientStore>>,
        clock: Arc<dyn Clock>,
        limits: InputLengthRestrictions,
    ) -> Self {
        TokenValidator {
            signer,
            reference_tokens,
            clients,
            clock,
            limits,
        }
    }

    pub async fn validate_access_token(
        &self,
        token: &str,
        expected_scope: Option<&str>,
    ) -> Result<TokenValidationResult, OAuthError> {
        let now = self.clock.now();

        let (token, reference_token_handle) = if token.contains('.') {
            if token.len() > self.limits.jwt {
                return Err(invalid_token("JWT too long"));
            }
            let jwt = self.signer.verify(token, None)?;
            if jwt.token_type != TOKEN_TYPE_ACCESS_TOKEN {
                return Err(invalid_token("Not an access token"));
            }
            (jwt, None)
        } else {
            if token.len() > self.limits.token_handle {
                return Err(invalid_token("Token too long"));
            }
            let Some(reference) = self.reference_tokens.get_reference_token(token).await? else {
                tracing::debug!("invalid reference token");
                return Err(invalid_token("Invalid reference token"));
            };
            if reference.is_expired(now) {
                tracing::debug!("reference token expired");
                self.reference_tokens.remove_reference_token(token).await?;
                return Err(invalid_token("Token expired"));
            }
            (reference, Some(token.to_string()))
        };

        if token.is_expired(now) {
            return Err(invalid_token("Token expired"));
        }

        let client = {
            let clients = self.clients.read().await;
            find_enabled_client(&*clients, &token.client_id)?
        };
        let Some(client) = client else {
            tracing::warn!(client_id = %token.client_id, "client of access token is unknown or disabled");
            return Err(invalid_token("Invalid client"));
        };

        if let Some(scope) = expected_scope {
            if !token.scopes().contains(scope) {
                return Err(OAuthError::InsufficientScopeError(format!(
                    "Token does not carry the {scope} scope"
                )));
            }
        }

        Ok(TokenValidationResult {
            token,
            client,
            reference_token_handle,
        })
    }
}

fn invalid_token(description: &str) -> OAuthError {
    OAuthError::InvalidTokenError(description.to_string())
}
