use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::resource::resource_store::ResourceStore;
use crate::oauth_provider::resource::resources::ResourceValidationResult;
use crate::oauth_provider::scope::scope_parser::ParsedScopesResult;
use crate::oauth_types::SCOPE_OFFLINE_ACCESS;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolves parsed scopes to the resources a client may use.
///
/// Scopes the client is not allowed to request, or that match no enabled resource,
/// are reported in `invalid_scopes` and never appear in the resolved resources.
/// Whether an invalid scope fails the request is up to the caller.
pub struct ResourceValidator {
    store: Arc<RwLock<dyn ResourceStore>>,
}

impl ResourceValidator {
    pub fn new(store: Arc<RwLock<dyn ResourceStore>>) -> Self {
        ResourceValidator { store }
    }

    pub async fn validate_requested_resources(
        &self,
        client: &Client,
        scopes: &ParsedScopesResult,
    ) -> Result<ResourceValidationResult, OAuthError> {
        let mut result = ResourceValidationResult::default();
        for error in &scopes.errors {
            result.invalid_scopes.insert(error.raw_value.clone());
        }

        let store = self.store.read().await;
        for scope in &scopes.parsed_scopes {
            let name = scope.parsed_name.as_str();

            if name == SCOPE_OFFLINE_ACCESS {
                if client.allow_offline_access {
                    result.resources.offline_access = true;
                    result.parsed_scopes.insert(scope.clone());
                } else {
                    tracing::warn!(client_id = %client.client_id, "offline_access requested but not allowed");
                    result.invalid_scopes.insert(scope.raw_value.clone());
                }
                continue;
            }

            if !client.allows_scope(name) {
                tracing::warn!(client_id = %client.client_id, scope = %scope.raw_value, "scope not allowed for client");
                result.invalid_scopes.insert(scope.raw_value.clone());
                continue;
            }

            let identity = store
                .find_identity_resources_by_scope_name(&[name])?
                .into_iter()
                .find(|r| r.enabled);
            let api_scope = store
                .find_api_scopes_by_name(&[name])?
                .into_iter()
                .find(|s| s.enabled);

            match (identity, api_scope) {
                (Some(_), Some(_)) => {
                    tracing::error!(scope = %name, "scope name is both an identity resource and an API scope");
                    result.invalid_scopes.insert(scope.raw_value.clone());
                }
                (Some(identity), None) => {
                    result.resources.add_identity_resource(identity);
                    result.parsed_scopes.insert(scope.clone());
                }
                (None, Some(api_scope)) => {
                    for api in store.find_api_resources_by_scope_name(&[name])? {
                        if api.enabled {
                            result.resources.add_api_resource(api);
                        }
                    }
                    result.resources.add_api_scope(api_scope);
                    result.parsed_scopes.insert(scope.clone());
                }
                (None, None) => {
                    tracing::warn!(client_id = %client.client_id, scope = %scope.raw_value, "scope not found in store");
                    result.invalid_scopes.insert(scope.raw_value.clone());
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth_provider::resource::resource_store::InMemoryResourceStore;
    use crate::oauth_provider::resource::resources::{ApiResource, ApiScope, IdentityResource};
    use crate::oauth_provider::scope::scope_parser::ScopeParser;
    use std::collections::BTreeSet;

    fn validator() -> ResourceValidator {
        let mut disabled = ApiScope::new("disabled");
        disabled.enabled = false;
        let store = InMemoryResourceStore::new(
            vec![IdentityResource::openid(), IdentityResource::profile()],
            vec![ApiResource::new("api", ["api1", "api2", "disabled"])],
            vec![ApiScope::new("api1"), ApiScope::new("api2"), disabled],
        );
        ResourceValidator::new(Arc::new(RwLock::new(store)))
    }

    fn client() -> Client {
        Client::new("client").with_scopes(["openid", "api1", "disabled", "unknown"])
    }

    #[tokio::test]
    async fn test_resolves_allowed_scopes() {
        let scopes = ScopeParser::new().parse_scope_string("openid api1");
        let result = validator()
            .validate_requested_resources(&client(), &scopes)
            .await
            .unwrap();
        assert!(result.succeeded());
        assert_eq!(
            result.resources.identity_resource_names(),
            BTreeSet::from(["openid".to_string()])
        );
        assert_eq!(result.resources.audiences(), vec!["api".to_string()]);
    }

    #[tokio::test]
    async fn test_disallowed_scopes_are_reported_not_dropped() {
        let scopes = ScopeParser::new().parse_scope_string("api1 api2 profile disabled unknown");
        let result = validator()
            .validate_requested_resources(&client(), &scopes)
            .await
            .unwrap();
        assert_eq!(
            result.invalid_scopes,
            BTreeSet::from([
                "api2".to_string(),
                "profile".to_string(),
                "disabled".to_string(),
                "unknown".to_string()
            ])
        );
        assert_eq!(result.resources.api_scope_names(), BTreeSet::from(["api1".to_string()]));
        assert!(result.resources.identity_resources.is_empty());
    }

    #[tokio::test]
    async fn test_offline_access_requires_client_permission() {
        let scopes = ScopeParser::new().parse_scope_string("api1 offline_access");
        let result = validator()
            .validate_requested_resources(&client(), &scopes)
            .await
            .unwrap();
        assert!(result.invalid_scopes.contains("offline_access"));
        assert!(!result.resources.offline_access);
        assert!(!result.contains_scope("offline_access"));

        let mut client = client();
        client.allow_offline_access = true;
        let result = validator()
            .validate_requested_resources(&client, &scopes)
            .await
            .unwrap();
        assert!(result.succeeded());
        assert!(result.resources.offline_access);
    }

    #[tokio::test]
    async fn test_name_collision_is_invalid() {
        let store = InMemoryResourceStore::new(
            vec![IdentityResource::new("shared", ["x"])],
            vec![],
            vec![ApiScope::new("shared")],
        );
        let validator = ResourceValidator::new(Arc::new(RwLock::new(store)));
        let client = Client::new("client").with_scopes(["shared"]);
        let scopes = ScopeParser::new().parse_scope_string("shared");
        let result = validator
            .validate_requested_resources(&client, &scopes)
            .await
            .unwrap();
        assert!(result.invalid_scopes.contains("shared"));
    }

    #[tokio::test]
    async fn test_parse_errors_are_invalid_scopes() {
        let scopes = ScopeParser::new().parse_scope_values(["api1", "bad:"]);
        let result = validator()
            .validate_requested_resources(&client(), &scopes)
            .await
            .unwrap();
        assert!(result.invalid_scopes.contains("bad:"));
        assert!(result.contains_scope("api1"));
    }
}
