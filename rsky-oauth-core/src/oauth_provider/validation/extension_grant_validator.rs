use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::validation::grant_validation_result::GrantValidationResult;
use crate::oauth_provider::validation::validated_request::ValidatedTokenRequest;
use crate::oauth_types::OAuthErrorCode;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A host-registered grant type.
#[async_trait::async_trait]
pub trait ExtensionGrantValidator: Send + Sync {
    /// The `grant_type` value this validator handles
    fn grant_type(&self) -> &str;

    async fn validate(&self, request: &ValidatedTokenRequest) -> anyhow::Result<GrantValidationResult>;
}

/// Registered extension grant validators, keyed by grant type name.
#[derive(Clone, Default)]
pub struct ExtensionGrantValidators {
    validators: BTreeMap<String, Arc<dyn ExtensionGrantValidator>>,
}

impl ExtensionGrantValidators {
    pub fn new(validators: Vec<Arc<dyn ExtensionGrantValidator>>) -> Self {
        ExtensionGrantValidators {
            validators: validators
                .into_iter()
                .map(|v| (v.grant_type().to_string(), v))
                .collect(),
        }
    }

    pub fn available_grant_types(&self) -> BTreeSet<String> {
        self.validators.keys().cloned().collect()
    }

    pub fn contains(&self, grant_type: &str) -> bool {
        self.validators.contains_key(grant_type)
    }

    /// Run the validator registered for the request's grant type. A validator that
    /// fails is logged and reported as `invalid_grant`.
    pub async fn validate(
        &self,
        request: &ValidatedTokenRequest,
    ) -> Result<GrantValidationResult, OAuthError> {
        let grant_type = request.grant_type.as_str();
        let Some(validator) = self.validators.get(grant_type) else {
            tracing::error!(grant_type, "no validator registered for extension grant");
            return Err(OAuthError::UnsupportedGrantTypeError(
                "Unsupported grant_type".to_string(),
            ));
        };
        match validator.validate(request).await {
            Ok(result) => Ok(result),
            Err(error) => {
                tracing::error!(%error, grant_type, client_id = %request.client.client_id, "extension grant validator failed");
                Ok(GrantValidationResult::error(OAuthErrorCode::InvalidGrant, None))
            }
        }
    }
}
