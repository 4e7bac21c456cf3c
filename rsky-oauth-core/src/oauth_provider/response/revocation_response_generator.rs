use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::reference_token_store::ReferenceTokenStore;
use crate::oauth_provider::grant::refresh_token_store::RefreshTokenStore;
use crate::oauth_provider::request::request_parameters::RequestParameters;
use crate::oauth_types::OAuthTokenTypeHint;

/// What a revocation request removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationOutcome {
    AccessTokenRevoked,
    RefreshTokenRevoked,
    /// Unknown token, or one belonging to another client
    NotFound,
}

/// Handles token revocation (RFC 7009). Unknown tokens are not an error.
pub struct RevocationResponseGenerator {
    reference_tokens: ReferenceTokenStore,
    refresh_tokens: RefreshTokenStore,
}

impl RevocationResponseGenerator {
    pub fn new(reference_tokens: ReferenceTokenStore, refresh_tokens: RefreshTokenStore) -> Self {
        RevocationResponseGenerator {
            reference_tokens,
            refresh_tokens,
        }
    }

    #[tracing::instrument(skip_all, fields(client_id = %client.client_id))]
    pub async fn process(
        &self,
        client: &Client,
        parameters: &RequestParameters,
    ) -> Result<RevocationOutcome, OAuthError> {
        let Some(token) = parameters.get("token") else {
            tracing::warn!("no token found for revocation");
            return Err(OAuthError::InvalidRequestError("token is missing".to_string()));
        };
        let hint = match parameters.get("token_type_hint") {
            None => None,
            Some(hint) => Some(hint.parse::<OAuthTokenTypeHint>().map_err(|_| {
                tracing::warn!(hint, "unsupported token type hint");
                OAuthError::UnsupportedTokenTypeError(format!("Unsupported token type {hint}"))
            })?),
        };

        let outcome = match hint {
            Some(OAuthTokenTypeHint::AccessToken) => {
                match self.revoke_access_token(client, token).await? {
                    RevocationOutcome::NotFound => self.revoke_refresh_token(client, token).await?,
                    outcome => outcome,
                }
            }
            Some(OAuthTokenTypeHint::RefreshToken) | None => {
                match self.revoke_refresh_token(client, token).await? {
                    RevocationOutcome::NotFound => self.revoke_access_token(client, token).await?,
                    outcome => outcome,
                }
            }
        };
        tracing::debug!(?outcome, "revocation processed");
        Ok(outcome)
    }

    async fn revoke_access_token(
        &self,
        client: &Client,
        token: &str,
    ) -> Result<RevocationOutcome, OAuthError> {
        let Some(reference) = self.reference_tokens.get_reference_token(token).await? else {
            return Ok(RevocationOutcome::NotFound);
        };
        if reference.client_id != client.client_id {
            tracing::warn!(token_client_id = %reference.client_id, "client tried to revoke an access token of another client");
            return Ok(RevocationOutcome::NotFound);
        }
        self.reference_tokens.remove_reference_token(token).await?;
        Ok(RevocationOutcome::AccessTokenRevoked)
    }

    /// Revoking a refresh token also revokes the reference access tokens issued to
    /// the same client and subject.
    async fn revoke_refresh_token(
        &self,
        client: &Client,
        token: &str,
    ) -> Result<RevocationOutcome, OAuthError> {
        let Some(refresh_token) = self.refresh_tokens.get_refresh_token(token).await? else {
            return Ok(RevocationOutcome::NotFound);
        };
        if refresh_token.client_id != client.client_id {
            tracing::warn!(token_client_id = %refresh_token.client_id, "client tried to revoke a refresh token of another client");
            return Ok(RevocationOutcome::NotFound);
        }
        self.refresh_tokens.remove_refresh_token(token).await?;
        self.reference_tokens
            .remove_reference_tokens(refresh_token.subject_id(), &client.client_id)
            .await?;
        Ok(RevocationOutcome::RefreshTokenRevoked)
    }
}
