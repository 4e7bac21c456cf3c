use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::client::client_store::{find_enabled_client, ClientStore};
use crate::oauth_provider::client::secret::Secret;
use crate::oauth_provider::client::secret_parser::{Credential, ParsedSecret, SecretParser};
use crate::oauth_provider::client::secret_validator::{
    HashedSharedSecretValidator, PrivateKeyJwtSecretValidator, SecretValidator,
    X509ThumbprintSecretValidator,
};
use crate::oauth_provider::clock::Clock;
use crate::oauth_provider::config::ProviderOptions;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::replay::replay_manager::ReplayManager;
use crate::oauth_provider::request::request_parameters::RequestParameters;
use http::HeaderMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An authenticated client and the credential it used.
#[derive(Debug, Clone)]
pub struct ClientSecretValidationResult {
    pub client: Client,
    pub secret: ParsedSecret,
}

pub struct ClientSecretValidator {
    clients: Arc<RwLock<dyn ClientStore>>,
    parser: SecretParser,
    validators: Vec<Box<dyn SecretValidator>>,
    clock: Arc<dyn Clock>,
}

impl ClientSecretValidator {
    pub fn new(
        clients: Arc<RwLock<dyn ClientStore>>,
        replay_manager: Arc<ReplayManager>,
        clock: Arc<dyn Clock>,
        options: &ProviderOptions,
    ) -> Self {
        let audiences = vec![options.token_endpoint.clone(), options.issuer_uri.clone()];
        ClientSecretValidator {
            clients,
            parser: SecretParser::new(options.input_length_restrictions.clone()),
            validators: vec![
                Box::new(HashedSharedSecretValidator),
                Box::new(X509ThumbprintSecretValidator),
                Box::new(PrivateKeyJwtSecretValidator::new(audiences, replay_manager)),
            ],
            clock,
        }
    }

    /// Authenticate the calling client. Every failure is `invalid_client` with the
    /// reason kept in the logs only.
    #[tracing::instrument(skip_all)]
    pub async fn validate(
        &self,
        headers: &HeaderMap,
        parameters: &RequestParameters,
        certificate_thumbprint: Option<&str>,
    ) -> Result<ClientSecretValidationResult, OAuthError> {
        let Some(parsed) = self
            .parser
            .parse(headers, parameters, certificate_thumbprint)
        else {
            tracing::warn!("no client id found");
            return Err(invalid_client());
        };

        let client = {
            let store = self.clients.read().await;
            find_enabled_client(&*store, &parsed.client_id)?
        };
        let Some(client) = client else {
            tracing::warn!(client_id = %parsed.client_id, "no client with that id found or client is disabled");
            return Err(invalid_client());
        };

        if !client.require_client_secret {
            tracing::debug!(client_id = %client.client_id, "public client, no secret required");
            return Ok(ClientSecretValidationResult {
                client,
                secret: parsed,
            });
        }

        if parsed.credential == Credential::NoSecret {
            tracing::warn!(client_id = %client.client_id, "client requires a secret but none was presented");
            return Err(invalid_client());
        }

        let now = self.clock.now();
        let secrets: Vec<Secret> = client
            .client_secrets
            .iter()
            .filter(|secret| !secret.is_expired(now))
            .cloned()
            .collect();

        for validator in &self.validators {
            if validator.validate(&secrets, &parsed).await {
                tracing::debug!(client_id = %client.client_id, method = parsed.method(), "client authenticated");
                return Ok(ClientSecretValidationResult {
                    client,
                    secret: parsed,
                });
            }
        }

        tracing::warn!(client_id = %client.client_id, method = parsed.method(), "client secret validation failed");
        Err(invalid_client())
    }
}

fn invalid_client() -> OAuthError {
    OAuthError::InvalidClientError("Client authentication failed".to_string())
}
