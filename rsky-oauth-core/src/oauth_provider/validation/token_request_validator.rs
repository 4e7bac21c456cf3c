use crate::oauth_provider::account::profile_service::ProfileService;
use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::client::client_secret_validator::ClientSecretValidationResult;
use crate::oauth_provider::clock::Clock;
use crate::oauth_provider::config::InputLengthRestrictions;
use crate::oauth_provider::device::device_code_validator::DeviceCodeValidator;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::authorization_code_store::AuthorizationCodeStore;
use crate::oauth_provider::request::pkce::PkceValidator;
use crate::oauth_provider::request::request_parameters::RequestParameters;
use crate::oauth_provider::resource::resource_validator::ResourceValidator;
use crate::oauth_provider::resource::resources::ResourceValidationResult;
use crate::oauth_provider::scope::scope_parser::{ParsedScopesResult, ScopeParser};
use crate::oauth_provider::token::refresh_token_service::RefreshTokenService;
use crate::oauth_provider::validation::extension_grant_validator::ExtensionGrantValidators;
use crate::oauth_provider::validation::resource_owner_validator::{
    ResourceOwnerPasswordValidationContext, ResourceOwnerPasswordValidator,
};
use crate::oauth_provider::validation::validated_request::ValidatedTokenRequest;
use crate::oauth_types::{OAuthGrantType, PROTOCOL_TYPE_OIDC, SCOPE_OFFLINE_ACCESS};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct TokenRequestValidatorOptions {
    pub input_length_restrictions: InputLengthRestrictions,
    pub clock: Arc<dyn Clock>,
    pub resource_validator: ResourceValidator,
    pub authorization_codes: AuthorizationCodeStore,
    pub refresh_tokens: Arc<RefreshTokenService>,
    pub device_codes: DeviceCodeValidator,
    pub profile: Arc<dyn ProfileService>,

    /**
     * Checks user name and password for the password grant. Hosts that do not
     * support the grant register `NotSupportedResourceOwnerPasswordValidator`.
     */
    pub resource_owner_validator: Arc<dyn ResourceOwnerPasswordValidator>,

    /**
     * Validators for grant types beyond the standard ones. A `grant_type` that is
     * neither standard nor registered here is `unsupported_grant_type`.
     */
    pub extension_grants: ExtensionGrantValidators,
}

/// Decides whether a token request from an authenticated client may be answered.
pub struct TokenRequestValidator {
    limits: InputLengthRestrictions,
    clock: Arc<dyn Clock>,
    scope_parser: ScopeParser,
    resource_validator: ResourceValidator,
    authorization_codes: AuthorizationCodeStore,
    pkce: PkceValidator,
    refresh_tokens: Arc<RefreshTokenService>,
    device_codes: DeviceCodeValidator,
    profile: Arc<dyn ProfileService>,
    resource_owner_validator: Arc<dyn ResourceOwnerPasswordValidator>,
    extension_grants: ExtensionGrantValidators,
}

impl TokenRequestValidator {
    pub fn new(options: TokenRequestValidatorOptions) -> Self {
        TokenRequestValidator {
            pkce: PkceValidator::new(options.input_length_restrictions.clone()),
            limits: options.input_length_restrictions,
            clock: options.clock,
            scope_parser: ScopeParser::new(),
            resource_validator: options.resource_validator,
            authorization_codes: options.authorization_codes,
            refresh_tokens: options.refresh_tokens,
            device_codes: options.device_codes,
            profile: options.profile,
            resource_owner_validator: options.resource_owner_validator,
            extension_grants: options.extension_grants,
        }
    }

    pub fn available_grant_types(&self) -> BTreeSet<String> {
        OAuthGrantType::standard()
            .iter()
            .map(|g| g.as_str().to_string())
            .chain(self.extension_grants.available_grant_types())
            .collect()
    }

    /**
     * Validate a token request.
     *
     * Runs the protocol check, the grant type checks, the grant specific stage and
     * finally resolves the requested scopes. The first failing stage decides the
     * error. Only a fully validated request is returned.
     */
    #[tracing::instrument(skip_all, fields(client_id = %client_result.client.client_id))]
    pub async fn validate_request(
        &self,
        parameters: RequestParameters,
        client_result: ClientSecretValidationResult,
    ) -> Result<ValidatedTokenRequest, OAuthError> {
        let grant_type = parameters.get("grant_type").unwrap_or_default().to_string();
        let result = self.validate(parameters, client_result).await;
        if let Err(error) = &result {
            match error.error_code() {
                Some(_) => tracing::warn!(grant_type = %grant_type, %error, "token request validation failed"),
                None => tracing::error!(grant_type = %grant_type, %error, "token request validation aborted"),
            }
        }
        result
    }

    async fn validate(
        &self,
        parameters: RequestParameters,
        client_result: ClientSecretValidationResult,
    ) -> Result<ValidatedTokenRequest, OAuthError> {
        let ClientSecretValidationResult { client, secret } = client_result;

        if client.protocol_type != PROTOCOL_TYPE_OIDC {
            tracing::error!(protocol_type = %client.protocol_type, "invalid protocol type for OIDC token endpoint");
            return Err(OAuthError::InvalidClientError(
                "Invalid protocol type".to_string(),
            ));
        }

        let grant_type = self.grant_type(&parameters)?;

        if !client.allows_grant_type(&grant_type) {
            tracing::error!(grant_type = %grant_type, "client not authorized for grant type");
            return Err(OAuthError::UnauthorizedClientError(format!(
                "Client not authorized for {grant_type}"
            )));
        }

        let now = self.clock.now();
        let mut request = ValidatedTokenRequest::new(parameters, client, secret, grant_type, now);

        match request.grant_type.clone() {
            OAuthGrantType::ClientCredentials => self.validate_client_credentials(&mut request).await?,
            OAuthGrantType::Password => self.validate_resource_owner(&mut request).await?,
            OAuthGrantType::AuthorizationCode => self.validate_authorization_code(&mut request).await?,
            OAuthGrantType::RefreshToken => self.validate_refresh_token(&mut request).await?,
            OAuthGrantType::DeviceCode => self.validate_device_code(&mut request).await?,
            OAuthGrantType::Extension(_) => self.validate_extension_grant(&mut request).await?,
        }

        tracing::debug!(grant_type = %request.grant_type, "token request validation success");
        Ok(request)
    }

    fn grant_type(&self, parameters: &RequestParameters) -> Result<OAuthGrantType, OAuthError> {
        let Some(grant_type) = parameters.get("grant_type") else {
            return Err(OAuthError::InvalidRequestError(
                "grant_type is missing".to_string(),
            ));
        };
        if grant_type.len() > self.limits.grant_type {
            return Err(OAuthError::UnsupportedGrantTypeError(
                "grant_type too long".to_string(),
            ));
        }
        let grant_type: OAuthGrantType = grant_type
            .parse()
            .map_err(|_| OAuthError::UnsupportedGrantTypeError("Invalid grant_type".to_string()))?;
        if let OAuthGrantType::Extension(name) = &grant_type {
            if !self.extension_grants.contains(name) {
                return Err(OAuthError::UnsupportedGrantTypeError(format!(
                    "Unsupported grant_type {name}"
                )));
            }
        }
        Ok(grant_type)
    }

    async fn validate_client_credentials(
        &self,
        request: &mut ValidatedTokenRequest,
    ) -> Result<(), OAuthError> {
        let explicit = request.raw.contains("scope");
        let resources = self.validate_requested_scopes(request).await?;

        if explicit {
            if !resources.resources.identity_resources.is_empty() {
                tracing::error!("client credentials token request includes identity scopes");
                return Err(OAuthError::InvalidScopeError(
                    "Client cannot request OpenID scopes in client credentials flow".to_string(),
                ));
            }
            if resources.resources.offline_access {
                tracing::error!("client credentials token request includes offline_access");
                return Err(OAuthError::InvalidScopeError(
                    "Client cannot request a refresh token in client credentials flow".to_string(),
                ));
            }
            request.validated_resources = resources;
        } else {
            // defaulted to every allowed scope, keep only the API scopes
            let api_scope_names = resources.resources.api_scope_names();
            let api_scopes: BTreeSet<String> = resources
                .parsed_scopes
                .iter()
                .filter(|s| api_scope_names.contains(&s.parsed_name))
                .map(|s| s.raw_value.clone())
                .collect();
            request.validated_resources = resources.filter(&api_scopes);
        }
        request.requested_scopes = request.validated_resources.raw_scope_values();
        Ok(())
    }

    async fn validate_resource_owner(
        &self,
        request: &mut ValidatedTokenRequest,
    ) -> Result<(), OAuthError> {
        let user_name = request.raw.get("username").map(str::to_string);
        let password = request.raw.get("password").map(str::to_string);
        let (Some(user_name), Some(password)) = (user_name, password) else {
            return Err(OAuthError::InvalidGrantError(
                "username or password is missing".to_string(),
            ));
        };
        if user_name.len() > self.limits.user_name || password.len() > self.limits.password {
            return Err(OAuthError::InvalidGrantError(
                "username or password too long".to_string(),
            ));
        }

        let resources = self.validate_requested_scopes(request).await?;
        request.validated_resources = resources;
        request.requested_scopes = request.validated_resources.raw_scope_values();
        request.user_name = Some(user_name.clone());

        let outcome = self
            .resource_owner_validator
            .validate(ResourceOwnerPasswordValidationContext {
                user_name: &user_name,
                password: &password,
                request: &*request,
            })
            .await;
        let (subject, custom_response) = match outcome {
            Ok(result) => result.into_result().inspect_err(|e| {
                tracing::warn!(user_name = %user_name, error = %e, "resource owner password credential validation failed");
            })?,
            Err(error) => {
                tracing::error!(%error, "resource owner password validator failed");
                return Err(OAuthError::InvalidGrantError(
                    "Invalid username or password".to_string(),
                ));
            }
        };

        self.ensure_active(&subject, &request.client).await?;
        request.subject = Some(subject);
        request.custom_response = custom_response;
        Ok(())
    }

    async fn validate_authorization_code(
        &self,
        request: &mut ValidatedTokenRequest,
    ) -> Result<(), OAuthError> {
        let client_id = request.client.client_id.clone();
        let Some(handle) = request.raw.get("code").map(str::to_string) else {
            return Err(OAuthError::InvalidGrantError(
                "Authorization code is missing".to_string(),
            ));
        };
        if handle.len() > self.limits.authorization_code {
            return Err(OAuthError::InvalidGrantError(
                "Authorization code is too long".to_string(),
            ));
        }

        // taken before any other check, so a code is never redeemed twice
        let Some(code) = self.authorization_codes.take_authorization_code(&handle).await? else {
            tracing::error!(client_id = %client_id, "invalid authorization code");
            return Err(OAuthError::InvalidGrantError(
                "Invalid authorization code".to_string(),
            ));
        };

        if code.client_id != client_id {
            tracing::error!(client_id = %client_id, code_client_id = %code.client_id, "client is trying to use a code from a different client");
            return Err(OAuthError::InvalidGrantError(
                "Invalid authorization code".to_string(),
            ));
        }

        if code.is_expired(request.request_time) {
            tracing::error!(client_id = %client_id, "authorization code expired");
            return Err(OAuthError::InvalidGrantError(
                "Authorization code expired".to_string(),
            ));
        }

        if !code.redirect_uri.is_empty() {
            match request.raw.get("redirect_uri") {
                Some(redirect_uri) if redirect_uri == code.redirect_uri => {}
                Some(_) => {
                    tracing::error!(client_id = %client_id, "redirect_uri does not match the authorization request");
                    return Err(OAuthError::InvalidGrantError(
                        "Invalid redirect_uri".to_string(),
                    ));
                }
                None => {
                    tracing::error!(client_id = %client_id, "redirect_uri is missing");
                    return Err(OAuthError::InvalidGrantError(
                        "redirect_uri is missing".to_string(),
                    ));
                }
            }
        }

        if code.requested_scopes.is_empty() {
            tracing::error!(client_id = %client_id, "authorization code has no associated scopes");
            return Err(OAuthError::InvalidGrantError(
                "Invalid authorization code".to_string(),
            ));
        }

        let code_verifier = request.raw.get("code_verifier").map(str::to_string);
        self.pkce
            .verify_code_exchange(&request.client, &code, code_verifier.as_deref())?;

        self.ensure_active(&code.subject, &request.client).await?;

        request.validated_resources = self
            .validate_stored_scopes(request, &code.requested_scopes)
            .await?;
        request.requested_scopes = request.validated_resources.raw_scope_values();
        request.subject = Some(code.subject.clone());
        request.session_id = code.session_id.clone();
        request.code_verifier = code_verifier;
        request.authorization_code_handle = Some(handle);
        request.authorization_code = Some(code);
        Ok(())
    }

    async fn validate_refresh_token(
        &self,
        request: &mut ValidatedTokenRequest,
    ) -> Result<(), OAuthError> {
        let Some(handle) = request.raw.get("refresh_token").map(str::to_string) else {
            return Err(OAuthError::InvalidRequestError(
                "Refresh token is missing".to_string(),
            ));
        };
        if handle.len() > self.limits.refresh_token {
            return Err(OAuthError::InvalidGrantError(
                "Refresh token too long".to_string(),
            ));
        }

        let token = self
            .refresh_tokens
            .validate_refresh_token(&handle, &request.client, request.request_time)
            .await?;

        request.validated_resources = self
            .validate_stored_scopes(request, &token.authorized_scopes)
            .await?;
        request.requested_scopes = request.validated_resources.raw_scope_values();
        request.subject = Some(token.subject.clone());
        request.session_id = token.session_id.clone();
        request.refresh_token_handle = Some(handle);
        request.refresh_token = Some(token);
        Ok(())
    }

    async fn validate_device_code(
        &self,
        request: &mut ValidatedTokenRequest,
    ) -> Result<(), OAuthError> {
        let Some(device_code) = request.raw.get("device_code").map(str::to_string) else {
            return Err(OAuthError::InvalidRequestError(
                "device_code is missing".to_string(),
            ));
        };
        if device_code.len() > self.limits.device_code {
            return Err(OAuthError::InvalidGrantError(
                "device_code too long".to_string(),
            ));
        }

        let details = self
            .device_codes
            .validate(&device_code, &request.client, request.request_time)
            .await?;

        request.validated_resources = self
            .validate_stored_scopes(request, &details.authorized_scopes)
            .await?;
        request.requested_scopes = request.validated_resources.raw_scope_values();
        request.subject = details.subject.clone();
        request.session_id = details.session_id.clone();
        request.device_code = Some(details);
        Ok(())
    }

    async fn validate_extension_grant(
        &self,
        request: &mut ValidatedTokenRequest,
    ) -> Result<(), OAuthError> {
        request.validated_resources = self.validate_requested_scopes(request).await?;
        request.requested_scopes = request.validated_resources.raw_scope_values();

        let (subject, custom_response) = self
            .extension_grants
            .validate(request)
            .await?
            .into_result()?;

        self.ensure_active(&subject, &request.client).await?;
        request.subject = Some(subject);
        request.custom_response = custom_response;
        Ok(())
    }

    /// Resolve the `scope` parameter, or every scope the client may request when it
    /// is absent. Any scope that does not resolve fails the request.
    async fn validate_requested_scopes(
        &self,
        request: &ValidatedTokenRequest,
    ) -> Result<ResourceValidationResult, OAuthError> {
        let scope = match request.raw.get("scope") {
            Some(scope) if scope.len() > self.limits.scope => {
                tracing::error!("scope parameter exceeds max allowed length");
                return Err(OAuthError::InvalidScopeError("Scope too long".to_string()));
            }
            other => other,
        };
        let parsed = match scope {
            Some(scope) => self.scope_parser.parse_scope_string(scope),
            None => {
                let defaults = request
                    .client
                    .allowed_scopes
                    .iter()
                    .filter(|s| s.as_str() != SCOPE_OFFLINE_ACCESS);
                self.scope_parser.parse_scope_values(defaults)
            }
        };
        self.resolve(&request.client, &parsed).await
    }

    /// Resolve scopes frozen at authorization time, narrowed to the `scope`
    /// parameter when one is sent.
    async fn validate_stored_scopes(
        &self,
        request: &ValidatedTokenRequest,
        granted: &BTreeSet<String>,
    ) -> Result<ResourceValidationResult, OAuthError> {
        let scopes: BTreeSet<String> = match request.raw.get("scope") {
            None => granted.clone(),
            Some(scope) if scope.len() > self.limits.scope => {
                tracing::error!("scope parameter exceeds max allowed length");
                return Err(OAuthError::InvalidScopeError("Scope too long".to_string()));
            }
            Some(scope) => {
                let narrowed: BTreeSet<String> = scope
                    .split(' ')
                    .filter(|s| granted.contains(*s))
                    .map(str::to_string)
                    .collect();
                if narrowed.is_empty() {
                    tracing::error!(requested = %scope, "requested scopes were not part of the original grant");
                    return Err(OAuthError::InvalidScopeError(
                        "Requested scopes exceed the original grant".to_string(),
                    ));
                }
                narrowed
            }
        };
        let parsed = self.scope_parser.parse_scope_values(&scopes);
        self.resolve(&request.client, &parsed).await
    }

    async fn resolve(
        &self,
        client: &Client,
        parsed: &ParsedScopesResult,
    ) -> Result<ResourceValidationResult, OAuthError> {
        let result = self
            .resource_validator
            .validate_requested_resources(client, parsed)
            .await?;
        if !result.succeeded() {
            let invalid: Vec<&str> = result.invalid_scopes.iter().map(String::as_str).collect();
            tracing::error!(invalid_scopes = ?invalid, "invalid scopes requested");
            return Err(OAuthError::InvalidScopeError(format!(
                "Invalid scopes: {}",
                invalid.join(" ")
            )));
        }
        Ok(result)
    }

    async fn ensure_active(&self, subject: &Subject, client: &Client) -> Result<(), OAuthError> {
        match self.profile.is_active(subject, client).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::error!(subject_id = %subject.subject_id, "user has been disabled");
                Err(OAuthError::InvalidGrantError("User is inactive".to_string()))
            }
            Err(error) => {
                tracing::error!(%error, subject_id = %subject.subject_id, "profile service failed");
                Err(OAuthError::InvalidGrantError("User is inactive".to_string()))
            }
        }
    }
}
