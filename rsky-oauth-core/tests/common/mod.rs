#![allow(dead_code)]
use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use rsky_oauth_core::oauth_provider::account::profile_service::InMemoryProfileService;
use rsky_oauth_core::oauth_provider::account::subject::{Claim, Subject};
use rsky_oauth_core::oauth_provider::client::client::{AccessTokenType, Client, TokenUsage};
use rsky_oauth_core::oauth_provider::client::client_store::InMemoryClientStore;
use rsky_oauth_core::oauth_provider::client::secret::Secret;
use rsky_oauth_core::oauth_provider::clock::FixedClock;
use rsky_oauth_core::oauth_provider::config::ProviderOptions;
use rsky_oauth_core::oauth_provider::device::device_flow_store::InMemoryDeviceFlowStore;
use rsky_oauth_core::oauth_provider::errors::OAuthError;
use rsky_oauth_core::oauth_provider::grant::persisted_grant_store_memory::InMemoryPersistedGrantStore;
use rsky_oauth_core::oauth_provider::oauth_provider::{OAuthProvider, OAuthProviderOptions};
use rsky_oauth_core::oauth_provider::replay::replay_store_memory::ReplayStoreMemory;
use rsky_oauth_core::oauth_provider::resource::resource_store::InMemoryResourceStore;
use rsky_oauth_core::oauth_provider::resource::resources::{
    ApiResource, ApiScope, IdentityResource,
};
use rsky_oauth_core::oauth_provider::validation::extension_grant_validator::{
    ExtensionGrantValidator, ExtensionGrantValidators,
};
use rsky_oauth_core::oauth_provider::validation::grant_validation_result::GrantValidationResult;
use rsky_oauth_core::oauth_provider::validation::resource_owner_validator::InMemoryResourceOwnerPasswordValidator;
use rsky_oauth_core::oauth_provider::validation::validated_request::ValidatedTokenRequest;
use rsky_oauth_core::oauth_types::{OAuthErrorCode, GRANT_TYPE_DEVICE_CODE};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const REDIRECT_URI: &str = "https://app.example.com/callback";
pub const API_SECRET: &str = "api-secret";
pub const ASSERTION_KEY: &[u8] = b"jwt-client-signing-key-0123456789abcdefghi";
const ASSERTION_JWK: &str =
    r#"{"kty":"oct","alg":"HS256","k":"and0LWNsaWVudC1zaWduaW5nLWtleS0wMTIzNDU2Nzg5YWJjZGVmZ2hp"}"#;

/// A provider over in-memory stores, plus handles on the pieces tests poke at.
pub struct TestProvider {
    pub provider: OAuthProvider,
    pub clock: Arc<FixedClock>,
    pub device_flow_store: Arc<RwLock<InMemoryDeviceFlowStore>>,
    pub persisted_grant_store: Arc<RwLock<InMemoryPersistedGrantStore>>,
}

/// Issues tokens for `custom` grants carrying a `user` parameter.
pub struct CustomGrantValidator;

#[async_trait::async_trait]
impl ExtensionGrantValidator for CustomGrantValidator {
    fn grant_type(&self) -> &str {
        "custom"
    }

    async fn validate(&self, request: &ValidatedTokenRequest) -> Result<GrantValidationResult> {
        if request.raw.contains("explode") {
            anyhow::bail!("validator backend unavailable");
        }
        Ok(match request.raw.get("user") {
            Some(user) => GrantValidationResult::success(Subject::new(user))
                .with_custom_response("custom_field", serde_json::json!("custom")),
            None => GrantValidationResult::error(
                OAuthErrorCode::InvalidGrant,
                Some("user is missing".to_string()),
            ),
        })
    }
}

pub fn clients() -> Vec<Client> {
    vec![
        Client::new("client")
            .with_grant_types(["client_credentials"])
            .with_secret(Secret::shared("secret"))
            .with_scopes(["api1", "api2"]),
        {
            let mut client = Client::new("client.reference")
                .with_grant_types(["client_credentials"])
                .with_secret(Secret::shared("secret"))
                .with_scopes(["api1"]);
            client.access_token_type = AccessTokenType::Reference;
            client
        },
        {
            let mut client = Client::new("codeclient")
                .with_grant_types(["authorization_code", "refresh_token"])
                .with_secret(Secret::shared("secret"))
                .with_redirect_uri(REDIRECT_URI)
                .with_scopes(["openid", "profile", "api1", "api2", "offline_access"]);
            client.allow_offline_access = true;
            client
        },
        {
            let mut client = Client::new("roclient")
                .with_grant_types(["password", "refresh_token"])
                .with_secret(Secret::shared("secret"))
                .with_scopes(["openid", "api1", "api2", "offline_access"]);
            client.allow_offline_access = true;
            client
        },
        {
            let mut client = Client::new("roclient.reuse")
                .with_grant_types(["password", "refresh_token"])
                .with_secret(Secret::shared("secret"))
                .with_scopes(["api1", "offline_access"]);
            client.allow_offline_access = true;
            client.refresh_token_usage = TokenUsage::ReUse;
            client
        },
        {
            let mut client = Client::new("roclient.reference")
                .with_grant_types(["password", "refresh_token"])
                .with_secret(Secret::shared("secret"))
                .with_scopes(["api1", "offline_access"]);
            client.allow_offline_access = true;
            client.access_token_type = AccessTokenType::Reference;
            client
        },
        {
            let mut client = Client::new("device")
                .with_grant_types([GRANT_TYPE_DEVICE_CODE])
                .with_scopes(["openid", "profile", "api1", "offline_access"]);
            client.require_client_secret = false;
            client.allow_offline_access = true;
            client
        },
        Client::new("jwtclient")
            .with_grant_types(["client_credentials"])
            .with_secret(Secret::json_web_key(ASSERTION_JWK))
            .with_scopes(["api1"]),
        Client::new("extension")
            .with_grant_types(["custom"])
            .with_secret(Secret::shared("secret"))
            .with_scopes(["api1"]),
    ]
}

pub fn resource_store() -> InMemoryResourceStore {
    InMemoryResourceStore::new(
        vec![IdentityResource::openid(), IdentityResource::profile()],
        vec![ApiResource::new("api", ["api1", "api2"]).with_secret(Secret::shared(API_SECRET))],
        vec![ApiScope::new("api1"), ApiScope::new("api2")],
    )
}

pub fn profile_service() -> InMemoryProfileService {
    InMemoryProfileService::new()
        .with_subject(
            "bob",
            vec![
                Claim::new("name", "Bob Smith"),
                Claim::new("given_name", "Bob"),
            ],
        )
        .with_subject("alice", vec![Claim::new("name", "Alice Smith")])
        .with_subject("mallory", vec![])
        .deactivate("mallory")
}

#[tracing::instrument(skip_all)]
pub fn build_provider() -> TestProvider {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let device_flow_store = Arc::new(RwLock::new(InMemoryDeviceFlowStore::new()));
    let persisted_grant_store = Arc::new(RwLock::new(InMemoryPersistedGrantStore::new()));

    let provider = OAuthProvider::new(OAuthProviderOptions {
        options: ProviderOptions::default(),
        clock: clock.clone(),
        client_store: Arc::new(RwLock::new(InMemoryClientStore::new(clients()))),
        resource_store: Arc::new(RwLock::new(resource_store())),
        persisted_grant_store: persisted_grant_store.clone(),
        device_flow_store: device_flow_store.clone(),
        replay_store: Arc::new(RwLock::new(ReplayStoreMemory::new())),
        profile_service: Arc::new(profile_service()),
        resource_owner_validator: Arc::new(
            InMemoryResourceOwnerPasswordValidator::new()
                .with_user("bob", "bob-password", "bob")
                .with_user("mallory", "mallory-password", "mallory"),
        ),
        extension_grants: ExtensionGrantValidators::new(vec![Arc::new(CustomGrantValidator)]),
    });

    TestProvider {
        provider,
        clock,
        device_flow_store,
        persisted_grant_store,
    }
}

pub fn basic_auth(client_id: &str, secret: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let credentials = STANDARD.encode(format!(
        "{}:{}",
        urlencoding::encode(client_id),
        urlencoding::encode(secret)
    ));
    if let Ok(value) = HeaderValue::from_str(&format!("Basic {credentials}")) {
        headers.insert(AUTHORIZATION, value);
    }
    headers
}

pub fn form(pairs: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}

/// A signed `private_key_jwt` assertion for `jwtclient`.
pub fn client_assertion(jti: &str, audience: &str) -> Result<String> {
    let claims = serde_json::json!({
        "iss": "jwtclient",
        "sub": "jwtclient",
        "aud": audience,
        "jti": jti,
        "iat": Utc::now().timestamp(),
        "exp": Utc::now().timestamp() + 300,
    });
    Ok(jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(ASSERTION_KEY),
    )?)
}

/// The wire error code of a failed call, `None` if it succeeded or failed with an
/// infrastructure error.
pub fn error_code<T>(result: Result<T, OAuthError>) -> Option<OAuthErrorCode> {
    result.err().and_then(|error| error.error_code())
}

pub fn bob() -> Subject {
    Subject::new("bob")
        .with_auth_time(Utc::now())
        .with_authentication_method("pwd")
}
