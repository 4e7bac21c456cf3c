use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::clock::Clock;
use crate::oauth_provider::config::{DeviceFlowOptions, InputLengthRestrictions, ProviderOptions};
use crate::oauth_provider::constants::DEVICE_CODE_PREFIX;
use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::device::device_code::{DeviceCode, DeviceCodeState};
use crate::oauth_provider::device::device_flow_store::DeviceFlowStore;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::handle::generate_handle;
use crate::oauth_provider::request::request_parameters::RequestParameters;
use crate::oauth_provider::resource::resource_validator::ResourceValidator;
use crate::oauth_provider::scope::scope_parser::ScopeParser;
use crate::oauth_types::OAuthGrantType;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

const MAX_USER_CODE_ATTEMPTS: usize = 10;

/// Body of the device authorization endpoint (RFC 8628 section 3.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuthorizationResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_uri_complete: Option<String>,
    pub expires_in: u64,
    pub interval: u64,
}

pub struct DeviceAuthorizationService {
    store: Arc<RwLock<dyn DeviceFlowStore>>,
    resource_validator: ResourceValidator,
    clock: Arc<dyn Clock>,
    limits: InputLengthRestrictions,
    options: DeviceFlowOptions,
}

impl DeviceAuthorizationService {
    pub fn new(
        store: Arc<RwLock<dyn DeviceFlowStore>>,
        resource_validator: ResourceValidator,
        clock: Arc<dyn Clock>,
        options: &ProviderOptions,
    ) -> Self {
        DeviceAuthorizationService {
            store,
            resource_validator,
            clock,
            limits: options.input_length_restrictions.clone(),
            options: options.device_flow.clone(),
        }
    }

    /// Start a device authorization for an authenticated client. Without a `scope`
    /// parameter the client's allowed scopes are requested.
    #[tracing::instrument(skip_all, fields(client_id = %client.client_id))]
    pub async fn process(
        &self,
        client: &Client,
        parameters: &RequestParameters,
    ) -> Result<DeviceAuthorizationResponse, OAuthError> {
        if !client.allows_grant_type(&OAuthGrantType::DeviceCode) {
            tracing::warn!("client is not allowed to use the device flow");
            return Err(OAuthError::UnauthorizedClientError(
                "Client not authorized for the device flow".to_string(),
            ));
        }

        let scope = parameters.get_bounded("scope", self.limits.scope)?;
        let parsed = match scope {
            Some(scope) => ScopeParser::new().parse_scope_string(scope),
            None => ScopeParser::new().parse_scope_values(&client.allowed_scopes),
        };
        if parsed.parsed_scopes.is_empty() && parsed.errors.is_empty() {
            tracing::warn!("no scopes requested and none allowed");
            return Err(OAuthError::InvalidScopeError("No scopes requested".to_string()));
        }
        let resources = self
            .resource_validator
            .validate_requested_resources(client, &parsed)
            .await?;
        if !resources.succeeded() {
            let invalid = resources.invalid_scopes.iter().cloned().collect::<Vec<_>>();
            tracing::warn!(invalid_scopes = ?invalid, "invalid scopes in device authorization request");
            return Err(OAuthError::InvalidScopeError(format!(
                "Invalid scopes: {}",
                invalid.join(" ")
            )));
        }

        let now = self.clock.now();
        let lifetime = client.device_code_lifetime;
        let mut details = DeviceCode::new(
            client.client_id.clone(),
            resources.raw_scope_values(),
            now,
            lifetime,
        );
        details.description = client.client_name.clone();

        let device_code = generate_handle(DEVICE_CODE_PREFIX);
        let user_code = self.store_with_unique_user_code(&device_code, details).await?;

        Ok(DeviceAuthorizationResponse {
            verification_uri_complete: verification_uri_complete(
                &self.options.verification_uri,
                &user_code,
            ),
            verification_uri: self.options.verification_uri.clone(),
            device_code,
            user_code,
            expires_in: lifetime,
            interval: self.options.interval,
        })
    }

    async fn store_with_unique_user_code(
        &self,
        device_code: &str,
        details: DeviceCode,
    ) -> Result<String, OAuthError> {
        let mut store = self.store.write().await;
        for _ in 0..MAX_USER_CODE_ATTEMPTS {
            let user_code = generate_user_code(self.options.user_code_length);
            if store.find_by_user_code(&user_code)?.is_some() {
                tracing::debug!("user code collision, generating another");
                continue;
            }
            store.store_device_authorization(device_code, &user_code, details)?;
            return Ok(user_code);
        }
        tracing::error!("failed to generate a unique user code");
        Err(OAuthError::RuntimeError(
            "Unable to generate a unique user code".to_string(),
        ))
    }
}

/// A numeric user code of the given length.
pub fn generate_user_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn verification_uri_complete(verification_uri: &str, user_code: &str) -> Option<String> {
    let mut url = Url::parse(verification_uri).ok()?;
    url.query_pairs_mut().append_pair("userCode", user_code);
    Some(url.to_string())
}

/// Records the user's decision on a pending device authorization.
pub struct DeviceFlowInteractionService {
    store: Arc<RwLock<dyn DeviceFlowStore>>,
    clock: Arc<dyn Clock>,
}

impl DeviceFlowInteractionService {
    pub fn new(store: Arc<RwLock<dyn DeviceFlowStore>>, clock: Arc<dyn Clock>) -> Self {
        DeviceFlowInteractionService { store, clock }
    }

    /// The pending request behind a user code, for display on the consent page.
    pub async fn get_authorization_context(
        &self,
        user_code: &str,
    ) -> Result<Option<DeviceCode>, OAuthError> {
        let details = self.store.read().await.find_by_user_code(user_code)?;
        Ok(details.filter(|d| !d.is_expired(self.clock.now())))
    }

    /// Approve the request for `subject`. Only scopes that were requested can be
    /// granted; granting none denies the request.
    pub async fn approve(
        &self,
        user_code: &str,
        subject: Subject,
        session_id: Option<String>,
        granted_scopes: BTreeSet<String>,
    ) -> Result<(), OAuthError> {
        let mut store = self.store.write().await;
        let mut details = self.pending(&*store, user_code)?;
        let authorized: BTreeSet<String> = granted_scopes
            .intersection(&details.requested_scopes)
            .cloned()
            .collect();
        if authorized.is_empty() {
            tracing::warn!(client_id = %details.client_id, "no scopes granted, denying device authorization");
            details.state = DeviceCodeState::Denied;
        } else {
            details.state = DeviceCodeState::Authorized;
            details.authorized_scopes = authorized;
            details.subject = Some(subject);
            details.session_id = session_id;
        }
        store.update_by_user_code(user_code, details)
    }

    pub async fn deny(&self, user_code: &str) -> Result<(), OAuthError> {
        let mut store = self.store.write().await;
        let mut details = self.pending(&*store, user_code)?;
        details.state = DeviceCodeState::Denied;
        store.update_by_user_code(user_code, details)
    }

    fn pending(&self, store: &dyn DeviceFlowStore, user_code: &str) -> Result<DeviceCode, OAuthError> {
        let details = store
            .find_by_user_code(user_code)?
            .filter(|d| !d.is_expired(self.clock.now()))
            .ok_or_else(|| OAuthError::InvalidRequestError("Invalid user code".to_string()))?;
        if details.state != DeviceCodeState::Pending {
            return Err(OAuthError::InvalidRequestError(
                "User code was already used".to_string(),
            ));
        }
        Ok(details)
    }
}
