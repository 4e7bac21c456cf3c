use crate::oauth_provider::client::secret::Secret;
use crate::oauth_provider::scope::parsed_scope_value::ParsedScopeValue;
use crate::oauth_types::SCOPE_OFFLINE_ACCESS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named group of user claims, requested by scope name (e.g. `openid`, `profile`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResource {
    pub name: String,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub required: bool,
    pub user_claims: BTreeSet<String>,
}

impl IdentityResource {
    pub fn new<I, S>(name: impl Into<String>, user_claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            display_name: None,
            enabled: true,
            required: false,
            user_claims: user_claims.into_iter().map(Into::into).collect(),
        }
    }

    pub fn openid() -> Self {
        let mut resource = Self::new("openid", ["sub"]);
        resource.required = true;
        resource
    }

    pub fn profile() -> Self {
        Self::new(
            "profile",
            ["name", "family_name", "given_name", "preferred_username", "updated_at"],
        )
    }

    pub fn email() -> Self {
        Self::new("email", ["email", "email_verified"])
    }
}

/// A permission that can be requested for one or more APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiScope {
    pub name: String,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub required: bool,
    pub user_claims: BTreeSet<String>,
}

impl ApiScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            enabled: true,
            required: false,
            user_claims: BTreeSet::new(),
        }
    }
}

/// A protected API, the audience of access tokens carrying any of its scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResource {
    pub name: String,
    pub display_name: Option<String>,
    pub enabled: bool,
    pub scopes: BTreeSet<String>,
    pub user_claims: BTreeSet<String>,
    /// Secrets the API uses to call the introspection endpoint
    pub api_secrets: Vec<Secret>,
}

impl ApiResource {
    pub fn new<I, S>(name: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            display_name: None,
            enabled: true,
            scopes: scopes.into_iter().map(Into::into).collect(),
            user_claims: BTreeSet::new(),
            api_secrets: vec![],
        }
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.api_secrets.push(secret);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
    pub identity_resources: Vec<IdentityResource>,
    pub api_resources: Vec<ApiResource>,
    pub api_scopes: Vec<ApiScope>,
    pub offline_access: bool,
}

impl Resources {
    pub fn add_identity_resource(&mut self, resource: IdentityResource) {
        if !self
            .identity_resources
            .iter()
            .any(|r| r.name == resource.name)
        {
            self.identity_resources.push(resource);
        }
    }

    pub fn add_api_scope(&mut self, scope: ApiScope) {
        if !self.api_scopes.iter().any(|s| s.name == scope.name) {
            self.api_scopes.push(scope);
        }
    }

    pub fn add_api_resource(&mut self, resource: ApiResource) {
        if !self.api_resources.iter().any(|r| r.name == resource.name) {
            self.api_resources.push(resource);
        }
    }

    pub fn identity_resource_names(&self) -> BTreeSet<String> {
        self.identity_resources
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    pub fn api_scope_names(&self) -> BTreeSet<String> {
        self.api_scopes.iter().map(|s| s.name.clone()).collect()
    }

    /// Audience values for access tokens issued for these resources.
    pub fn audiences(&self) -> Vec<String> {
        self.api_resources.iter().map(|r| r.name.clone()).collect()
    }

    /// Claim types requested through the identity resources.
    pub fn identity_claim_types(&self) -> BTreeSet<String> {
        self.identity_resources
            .iter()
            .flat_map(|r| r.user_claims.iter().cloned())
            .collect()
    }

    /// Claim types requested through API resources and scopes.
    pub fn api_claim_types(&self) -> BTreeSet<String> {
        self.api_resources
            .iter()
            .flat_map(|r| r.user_claims.iter().cloned())
            .chain(self.api_scopes.iter().flat_map(|s| s.user_claims.iter().cloned()))
            .collect()
    }
}

/// Outcome of resolving parsed scopes against a client and the registered resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceValidationResult {
    pub resources: Resources,
    /// Scopes that resolved, in the form they were requested
    pub parsed_scopes: BTreeSet<ParsedScopeValue>,
    pub invalid_scopes: BTreeSet<String>,
}

impl ResourceValidationResult {
    pub fn succeeded(&self) -> bool {
        self.invalid_scopes.is_empty()
    }

    pub fn raw_scope_values(&self) -> BTreeSet<String> {
        self.parsed_scopes
            .iter()
            .map(|s| s.raw_value.clone())
            .collect()
    }

    /// Space-delimited scope string for responses and token claims.
    pub fn scope_string(&self) -> String {
        self.raw_scope_values()
            .into_iter()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn contains_scope(&self, name: &str) -> bool {
        self.parsed_scopes.iter().any(|s| s.parsed_name == name)
    }

    /// Narrow the result to the given raw scope values, dropping resources that are
    /// no longer referenced.
    pub fn filter(&self, raw_scope_values: &BTreeSet<String>) -> ResourceValidationResult {
        let parsed_scopes: BTreeSet<ParsedScopeValue> = self
            .parsed_scopes
            .iter()
            .filter(|s| raw_scope_values.contains(&s.raw_value))
            .cloned()
            .collect();
        let names: BTreeSet<&str> = parsed_scopes
            .iter()
            .map(|s| s.parsed_name.as_str())
            .collect();

        let mut resources = Resources {
            offline_access: self.resources.offline_access
                && names.contains(SCOPE_OFFLINE_ACCESS),
            ..Default::default()
        };
        for resource in &self.resources.identity_resources {
            if names.contains(resource.name.as_str()) {
                resources.add_identity_resource(resource.clone());
            }
        }
        for scope in &self.resources.api_scopes {
            if names.contains(scope.name.as_str()) {
                resources.add_api_scope(scope.clone());
            }
        }
        for api in &self.resources.api_resources {
            if api.scopes.iter().any(|s| names.contains(s.as_str())) {
                resources.add_api_resource(api.clone());
            }
        }
        ResourceValidationResult {
            resources,
            parsed_scopes,
            invalid_scopes: BTreeSet::new(),
        }
    }
}
