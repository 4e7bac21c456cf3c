use crate::oauth_provider::account::profile_service::ProfileService;
use crate::oauth_provider::client::client_secret_validator::{
    ClientSecretValidationResult, ClientSecretValidator,
};
use crate::oauth_provider::client::client_store::ClientStore;
use crate::oauth_provider::clock::Clock;
use crate::oauth_provider::config::ProviderOptions;
use crate::oauth_provider::consent::consent_service::ConsentService;
use crate::oauth_provider::device::device_authorization_service::{
    DeviceAuthorizationResponse, DeviceAuthorizationService, DeviceFlowInteractionService,
};
use crate::oauth_provider::device::device_code_validator::DeviceCodeValidator;
use crate::oauth_provider::device::device_flow_store::DeviceFlowStore;
use crate::oauth_provider::device::device_flow_throttling::InMemoryDeviceFlowThrottlingService;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::authorization_code_store::AuthorizationCodeStore;
use crate::oauth_provider::grant::persisted_grant_service::PersistedGrantService;
use crate::oauth_provider::grant::persisted_grant_store::PersistedGrantStore;
use crate::oauth_provider::grant::reference_token_store::ReferenceTokenStore;
use crate::oauth_provider::grant::refresh_token_store::RefreshTokenStore;
use crate::oauth_provider::grant::user_consent_store::UserConsentStore;
use crate::oauth_provider::replay::replay_manager::ReplayManager;
use crate::oauth_provider::replay::replay_store::ReplayStore;
use crate::oauth_provider::request::authorization_code::AuthorizationCode;
use crate::oauth_provider::request::request_parameters::RequestParameters;
use crate::oauth_provider::resource::resource_store::ResourceStore;
use crate::oauth_provider::resource::resource_validator::ResourceValidator;
use crate::oauth_provider::response::introspection_response_generator::IntrospectionResponseGenerator;
use crate::oauth_provider::response::revocation_response_generator::{
    RevocationOutcome, RevocationResponseGenerator,
};
use crate::oauth_provider::response::token_response_generator::TokenResponseGenerator;
use crate::oauth_provider::response::user_info_response_generator::UserInfoResponseGenerator;
use crate::oauth_provider::token::refresh_token_service::RefreshTokenService;
use crate::oauth_provider::token::signer::Signer;
use crate::oauth_provider::token::token_service::TokenService;
use crate::oauth_provider::token::token_validator::TokenValidator;
use crate::oauth_provider::validation::extension_grant_validator::ExtensionGrantValidators;
use crate::oauth_provider::validation::resource_owner_validator::ResourceOwnerPasswordValidator;
use crate::oauth_provider::validation::token_request_validator::{
    TokenRequestValidator, TokenRequestValidatorOptions,
};
use crate::oauth_provider::validation::validated_request::ValidatedTokenRequest;
use crate::oauth_types::{OAuthIntrospectionResponse, OAuthTokenResponse};
use http::HeaderMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct OAuthProviderOptions {
    pub options: ProviderOptions,
    pub clock: Arc<dyn Clock>,

    pub client_store: Arc<RwLock<dyn ClientStore>>,
    pub resource_store: Arc<RwLock<dyn ResourceStore>>,

    /**
     * Backing store for authorization codes, refresh tokens, reference tokens and
     * consents.
     */
    pub persisted_grant_store: Arc<RwLock<dyn PersistedGrantStore>>,
    pub device_flow_store: Arc<RwLock<dyn DeviceFlowStore>>,

    /**
     * Remembers client assertion `jti` values. A memory store only protects a
     * single process.
     */
    pub replay_store: Arc<RwLock<dyn ReplayStore>>,

    pub profile_service: Arc<dyn ProfileService>,
    pub resource_owner_validator: Arc<dyn ResourceOwnerPasswordValidator>,
    pub extension_grants: ExtensionGrantValidators,
}

/// The token endpoint and its neighbours, wired over host-provided stores.
pub struct OAuthProvider {
    client_secret_validator: ClientSecretValidator,
    token_request_validator: TokenRequestValidator,
    token_response_generator: TokenResponseGenerator,
    introspection: IntrospectionResponseGenerator,
    revocation: RevocationResponseGenerator,
    user_info: UserInfoResponseGenerator,
    pub device_authorization: DeviceAuthorizationService,
    pub device_interaction: DeviceFlowInteractionService,
    pub consent: ConsentService,
    pub grants: PersistedGrantService,
    authorization_codes: AuthorizationCodeStore,
}

impl OAuthProvider {
    pub fn new(options: OAuthProviderOptions) -> Self {
        let OAuthProviderOptions {
            options,
            clock,
            client_store,
            resource_store,
            persisted_grant_store,
            device_flow_store,
            replay_store,
            profile_service,
            resource_owner_validator,
            extension_grants,
        } = options;
        let limits = options.input_length_restrictions.clone();

        let replay_manager = Arc::new(ReplayManager::new(replay_store, clock.clone()));
        let client_secret_validator = ClientSecretValidator::new(
            client_store.clone(),
            replay_manager,
            clock.clone(),
            &options,
        );

        let signer = Arc::new(Signer::new(options.issuer_uri.clone(), &options.signing));
        let refresh_token_service = Arc::new(RefreshTokenService::new(
            RefreshTokenStore::new(persisted_grant_store.clone()),
            profile_service.clone(),
        ));
        let token_service = Arc::new(TokenService::new(
            signer.clone(),
            ReferenceTokenStore::new(persisted_grant_store.clone()),
            profile_service.clone(),
        ));
        let token_validator = Arc::new(TokenValidator::new(
            signer,
            ReferenceTokenStore::new(persisted_grant_store.clone()),
            client_store,
            clock.clone(),
            limits.clone(),
        ));

        let throttling = Arc::new(RwLock::new(InMemoryDeviceFlowThrottlingService::new(
            options.device_flow.interval,
        )));
        let token_request_validator = TokenRequestValidator::new(TokenRequestValidatorOptions {
            input_length_restrictions: limits.clone(),
            clock: clock.clone(),
            resource_validator: ResourceValidator::new(resource_store.clone()),
            authorization_codes: AuthorizationCodeStore::new(persisted_grant_store.clone()),
            refresh_tokens: refresh_token_service.clone(),
            device_codes: DeviceCodeValidator::new(
                device_flow_store.clone(),
                throttling,
                profile_service.clone(),
            ),
            profile: profile_service.clone(),
            resource_owner_validator,
            extension_grants,
        });

        OAuthProvider {
            client_secret_validator,
            token_request_validator,
            token_response_generator: TokenResponseGenerator::new(
                token_service,
                refresh_token_service,
            ),
            introspection: IntrospectionResponseGenerator::new(
                resource_store.clone(),
                token_validator.clone(),
                clock.clone(),
                limits,
            ),
            revocation: RevocationResponseGenerator::new(
                ReferenceTokenStore::new(persisted_grant_store.clone()),
                RefreshTokenStore::new(persisted_grant_store.clone()),
            ),
            user_info: UserInfoResponseGenerator::new(
                token_validator,
                resource_store.clone(),
                profile_service,
            ),
            device_authorization: DeviceAuthorizationService::new(
                device_flow_store.clone(),
                ResourceValidator::new(resource_store),
                clock.clone(),
                &options,
            ),
            device_interaction: DeviceFlowInteractionService::new(device_flow_store, clock.clone()),
            consent: ConsentService::new(
                UserConsentStore::new(persisted_grant_store.clone()),
                clock,
            ),
            grants: PersistedGrantService::new(persisted_grant_store.clone()),
            authorization_codes: AuthorizationCodeStore::new(persisted_grant_store),
        }
    }

    pub async fn authenticate_client(
        &self,
        headers: &HeaderMap,
        parameters: &RequestParameters,
        certificate_thumbprint: Option<&str>,
    ) -> Result<ClientSecretValidationResult, OAuthError> {
        self.client_secret_validator
            .validate(headers, parameters, certificate_thumbprint)
            .await
    }

    /// Token endpoint: authenticate the client, validate the request and issue the
    /// tokens.
    pub async fn token(
        &self,
        headers: &HeaderMap,
        body: &str,
        certificate_thumbprint: Option<&str>,
    ) -> Result<OAuthTokenResponse, OAuthError> {
        let request = self
            .validate_token_request(headers, body, certificate_thumbprint)
            .await?;
        self.create_token_response(&request).await
    }

    /// Issue the tokens for a request that already passed validation.
    pub async fn create_token_response(
        &self,
        request: &ValidatedTokenRequest,
    ) -> Result<OAuthTokenResponse, OAuthError> {
        self.token_response_generator.process(request).await
    }

    pub async fn validate_token_request(
        &self,
        headers: &HeaderMap,
        body: &str,
        certificate_thumbprint: Option<&str>,
    ) -> Result<ValidatedTokenRequest, OAuthError> {
        let parameters = RequestParameters::from_form(body)?;
        let client = self
            .authenticate_client(headers, &parameters, certificate_thumbprint)
            .await?;
        self.token_request_validator
            .validate_request(parameters, client)
            .await
    }

    /// Persist a code produced by the authorize endpoint and return its handle.
    pub async fn create_authorization_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<String, OAuthError> {
        self.authorization_codes.store_authorization_code(code).await
    }

    pub async fn device_authorize(
        &self,
        headers: &HeaderMap,
        body: &str,
    ) -> Result<DeviceAuthorizationResponse, OAuthError> {
        let parameters = RequestParameters::from_form(body)?;
        let client = self.authenticate_client(headers, &parameters, None).await?;
        self.device_authorization
            .process(&client.client, &parameters)
            .await
    }

    pub async fn introspect(
        &self,
        headers: &HeaderMap,
        body: &str,
    ) -> Result<OAuthIntrospectionResponse, OAuthError> {
        let parameters = RequestParameters::from_form(body)?;
        let api = self.introspection.authenticate_api(headers, &parameters).await?;
        self.introspection.process(&api, &parameters).await
    }

    pub async fn revoke(
        &self,
        headers: &HeaderMap,
        body: &str,
    ) -> Result<RevocationOutcome, OAuthError> {
        let parameters = RequestParameters::from_form(body)?;
        let client = self.authenticate_client(headers, &parameters, None).await?;
        self.revocation.process(&client.client, &parameters).await
    }

    pub async fn user_info(&self, access_token: &str) -> Result<Map<String, Value>, OAuthError> {
        self.user_info.process(access_token).await
    }
}
