use crate::oauth_provider::client::secret_parser::SecretParser;
use crate::oauth_provider::client::secret_validator::{HashedSharedSecretValidator, SecretValidator};
use crate::oauth_provider::clock::Clock;
use crate::oauth_provider::config::InputLengthRestrictions;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::request::request_parameters::RequestParameters;
use crate::oauth_provider::resource::resource_store::ResourceStore;
use crate::oauth_provider::resource::resources::ApiResource;
use crate::oauth_provider::token::token_validator::TokenValidator;
use crate::oauth_types::{ActiveTokenInfo, OAuthIntrospectionResponse, OAuthTokenTypeHint};
use http::HeaderMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Answers introspection requests (RFC 7662) from API resources.
pub struct IntrospectionResponseGenerator {
    resources: Arc<RwLock<dyn ResourceStore>>,
    parser: SecretParser,
    token_validator: Arc<TokenValidator>,
    clock: Arc<dyn Clock>,
}

impl IntrospectionResponseGenerator {
    pub fn new(
        resources: Arc<RwLock<dyn ResourceStore>>,
        token_validator: Arc<TokenValidator>,
        clock: Arc<dyn Clock>,
        limits: InputLengthRestrictions,
    ) -> Self {
        IntrospectionResponseGenerator {
            resources,
            parser: SecretParser::new(limits),
            token_validator,
            clock,
        }
    }

    /// Authenticate the calling API resource with one of its shared secrets.
    pub async fn authenticate_api(
        &self,
        headers: &HeaderMap,
        parameters: &RequestParameters,
    ) -> Result<ApiResource, OAuthError> {
        let unauthorized = || OAuthError::InvalidClientError("API authentication failed".to_string());
        let Some(parsed) = self.parser.parse(headers, parameters, None) else {
            tracing::warn!("no API resource credentials found");
            return Err(unauthorized());
        };
        let api = self
            .resources
            .read()
            .await
            .find_api_resources_by_name(&[parsed.client_id.as_str()])?
            .into_iter()
            .find(|api| api.enabled);
        let Some(api) = api else {
            tracing::warn!(api = %parsed.client_id, "no enabled API resource with that name");
            return Err(unauthorized());
        };
        let now = self.clock.now();
        let secrets: Vec<_> = api
            .api_secrets
            .iter()
            .filter(|s| !s.is_expired(now))
            .cloned()
            .collect();
        if !HashedSharedSecretValidator.validate(&secrets, &parsed).await {
            tracing::warn!(api = %api.name, "API resource secret validation failed");
            return Err(unauthorized());
        }
        Ok(api)
    }

    /**
     * Describe `token` as seen by `api`.
     *
     * Invalid or expired tokens, tokens whose audience does not include the API and
     * tokens without any of the API's scopes are reported inactive. Only the API's
     * own scopes are disclosed. Refresh tokens are never introspected.
     */
    #[tracing::instrument(skip_all, fields(api = %api.name))]
    pub async fn process(
        &self,
        api: &ApiResource,
        parameters: &RequestParameters,
    ) -> Result<OAuthIntrospectionResponse, OAuthError> {
        let Some(token) = parameters.get("token") else {
            return Err(OAuthError::InvalidRequestError("token is missing".to_string()));
        };
        if let Some(hint) = parameters.get("token_type_hint") {
            match hint.parse::<OAuthTokenTypeHint>() {
                Ok(OAuthTokenTypeHint::AccessToken) => {}
                Ok(OAuthTokenTypeHint::RefreshToken) | Err(_) => {
                    tracing::debug!(hint, "token type hint not supported for introspection");
                    return Ok(OAuthIntrospectionResponse::inactive());
                }
            }
        }

        let result = match self.token_validator.validate_access_token(token, None).await {
            Ok(result) => result,
            Err(error) if error.is_protocol_error() => {
                tracing::debug!(%error, "introspected token is not valid");
                return Ok(OAuthIntrospectionResponse::inactive());
            }
            Err(error) => return Err(error),
        };
        let token = result.token;

        if !token.audiences.iter().any(|aud| aud == &api.name) {
            tracing::warn!("token is not meant for this API");
            return Ok(OAuthIntrospectionResponse::inactive());
        }
        let scopes: BTreeSet<String> = token
            .scopes()
            .intersection(&api.scopes)
            .cloned()
            .collect();
        if scopes.is_empty() {
            tracing::warn!("token carries none of the API's scopes");
            return Ok(OAuthIntrospectionResponse::inactive());
        }

        let iat = token.creation_time.timestamp();
        Ok(OAuthIntrospectionResponse::active(ActiveTokenInfo {
            scope: Some(scopes.into_iter().collect::<Vec<_>>().join(" ")),
            client_id: Some(token.client_id.clone()),
            token_type: Some("access_token".to_string()),
            aud: token.audiences.clone(),
            exp: Some(token.expiration().timestamp()),
            iat: Some(iat),
            nbf: Some(iat),
            iss: Some(token.issuer.clone()),
            jti: token.jwt_id().map(str::to_string),
            sub: token.subject_id().map(str::to_string),
        }))
    }
}
