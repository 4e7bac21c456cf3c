use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::validation::grant_validation_result::GrantValidationResult;
use crate::oauth_provider::validation::validated_request::ValidatedTokenRequest;
use crate::oauth_types::OAuthErrorCode;
use chrono::Utc;
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

pub struct ResourceOwnerPasswordValidationContext<'a> {
    pub user_name: &'a str,
    pub password: &'a str,
    pub request: &'a ValidatedTokenRequest,
}

/// Host-provided check of resource owner credentials for the password grant.
#[async_trait::async_trait]
pub trait ResourceOwnerPasswordValidator: Send + Sync {
    async fn validate(
        &self,
        context: ResourceOwnerPasswordValidationContext<'_>,
    ) -> anyhow::Result<GrantValidationResult>;
}

/// Rejects every password grant. Used when the host registers no validator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotSupportedResourceOwnerPasswordValidator;

#[async_trait::async_trait]
impl ResourceOwnerPasswordValidator for NotSupportedResourceOwnerPasswordValidator {
    async fn validate(
        &self,
        context: ResourceOwnerPasswordValidationContext<'_>,
    ) -> anyhow::Result<GrantValidationResult> {
        tracing::warn!(client_id = %context.request.client.client_id, "resource owner password grant is not supported");
        Ok(GrantValidationResult::error(
            OAuthErrorCode::UnsupportedGrantType,
            None,
        ))
    }
}

#[derive(Debug, Clone)]
struct TestUser {
    password: String,
    subject_id: String,
}

/// Validates against a fixed list of users, for development and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryResourceOwnerPasswordValidator {
    users: BTreeMap<String, TestUser>,
}

impl InMemoryResourceOwnerPasswordValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(
        mut self,
        user_name: impl Into<String>,
        password: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        self.users.insert(
            user_name.into(),
            TestUser {
                password: password.into(),
                subject_id: subject_id.into(),
            },
        );
        self
    }
}

#[async_trait::async_trait]
impl ResourceOwnerPasswordValidator for InMemoryResourceOwnerPasswordValidator {
    async fn validate(
        &self,
        context: ResourceOwnerPasswordValidationContext<'_>,
    ) -> anyhow::Result<GrantValidationResult> {
        let Some(user) = self.users.get(context.user_name) else {
            return Ok(GrantValidationResult::error(OAuthErrorCode::InvalidGrant, None));
        };
        if !bool::from(user.password.as_bytes().ct_eq(context.password.as_bytes())) {
            return Ok(GrantValidationResult::error(OAuthErrorCode::InvalidGrant, None));
        }
        let subject = Subject::new(user.subject_id.clone())
            .with_auth_time(Utc::now())
            .with_authentication_method("pwd");
        Ok(GrantValidationResult::success(subject))
    }
}
