use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::resource::resources::{ApiResource, ApiScope, IdentityResource};

/// Lookup of registered resources. Implementations return disabled entries too;
/// callers filter on `enabled`.
pub trait ResourceStore: Send + Sync {
    fn find_identity_resources_by_scope_name(
        &self,
        names: &[&str],
    ) -> Result<Vec<IdentityResource>, OAuthError>;

    fn find_api_scopes_by_name(&self, names: &[&str]) -> Result<Vec<ApiScope>, OAuthError>;

    /// API resources that contain any of the given scopes.
    fn find_api_resources_by_scope_name(
        &self,
        names: &[&str],
    ) -> Result<Vec<ApiResource>, OAuthError>;

    fn find_api_resources_by_name(&self, names: &[&str]) -> Result<Vec<ApiResource>, OAuthError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryResourceStore {
    identity_resources: Vec<IdentityResource>,
    api_resources: Vec<ApiResource>,
    api_scopes: Vec<ApiScope>,
}

impl InMemoryResourceStore {
    pub fn new(
        identity_resources: Vec<IdentityResource>,
        api_resources: Vec<ApiResource>,
        api_scopes: Vec<ApiScope>,
    ) -> Self {
        InMemoryResourceStore {
            identity_resources,
            api_resources,
            api_scopes,
        }
    }
}

impl ResourceStore for InMemoryResourceStore {
    fn find_identity_resources_by_scope_name(
        &self,
        names: &[&str],
    ) -> Result<Vec<IdentityResource>, OAuthError> {
        Ok(self
            .identity_resources
            .iter()
            .filter(|r| names.contains(&r.name.as_str()))
            .cloned()
            .collect())
    }

    fn find_api_scopes_by_name(&self, names: &[&str]) -> Result<Vec<ApiScope>, OAuthError> {
        Ok(self
            .api_scopes
            .iter()
            .filter(|s| names.contains(&s.name.as_str()))
            .cloned()
            .collect())
    }

    fn find_api_resources_by_scope_name(
        &self,
        names: &[&str],
    ) -> Result<Vec<ApiResource>, OAuthError> {
        Ok(self
            .api_resources
            .iter()
            .filter(|r| r.scopes.iter().any(|s| names.contains(&s.as_str())))
            .cloned()
            .collect())
    }

    fn find_api_resources_by_name(&self, names: &[&str]) -> Result<Vec<ApiResource>, OAuthError> {
        Ok(self
            .api_resources
            .iter()
            .filter(|r| names.contains(&r.name.as_str()))
            .cloned()
            .collect())
    }
}
