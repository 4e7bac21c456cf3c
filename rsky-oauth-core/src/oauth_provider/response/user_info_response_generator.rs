use crate::oauth_provider::account::profile_service::{
    ProfileDataCaller, ProfileDataRequest, ProfileService,
};
use crate::oauth_provider::account::subject::{Subject, CLAIM_SUBJECT};
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::resource::resource_store::ResourceStore;
use crate::oauth_provider::token::token_validator::TokenValidator;
use crate::oauth_types::SCOPE_OPENID;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Builds the OpenID Connect userinfo response for a bearer access token.
pub struct UserInfoResponseGenerator {
    token_validator: Arc<TokenValidator>,
    resources: Arc<RwLock<dyn ResourceStore>>,
    profile: Arc<dyn ProfileService>,
}

impl UserInfoResponseGenerator {
    pub fn new(
        token_validator: Arc<TokenValidator>,
        resources: Arc<RwLock<dyn ResourceStore>>,
        profile: Arc<dyn ProfileService>,
    ) -> Self {
        UserInfoResponseGenerator {
            token_validator,
            resources,
            profile,
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn process(&self, access_token: &str) -> Result<Map<String, Value>, OAuthError> {
        let result = self
            .token_validator
            .validate_access_token(access_token, Some(SCOPE_OPENID))
            .await?;
        let token = result.token;
        let Some(subject_id) = token.subject_id() else {
            tracing::error!(client_id = %token.client_id, "token has no sub claim");
            return Err(OAuthError::InvalidTokenError(
                "Token contains no sub claim".to_string(),
            ));
        };
        let subject = Subject::new(subject_id);

        match self.profile.is_active(&subject, &result.client).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(subject_id, "user is not active");
                return Err(OAuthError::InvalidTokenError("User is not active".to_string()));
            }
            Err(error) => {
                tracing::error!(%error, "profile service failed");
                return Err(OAuthError::RuntimeError(format!("Profile service failed: {error}")));
            }
        }

        let scopes = token.scopes();
        let scope_names: Vec<&str> = scopes.iter().map(String::as_str).collect();
        let requested_claim_types: BTreeSet<String> = self
            .resources
            .read()
            .await
            .find_identity_resources_by_scope_name(&scope_names)?
            .into_iter()
            .filter(|r| r.enabled)
            .flat_map(|r| r.user_claims)
            .collect();

        let claims = self
            .profile
            .get_claims(ProfileDataRequest {
                subject: &subject,
                client: &result.client,
                caller: ProfileDataCaller::UserInfoEndpoint,
                requested_claim_types: requested_claim_types.clone(),
            })
            .await
            .map_err(|error| {
                tracing::error!(%error, "profile service failed to return claims");
                OAuthError::RuntimeError(format!("Profile service failed: {error}"))
            })?;

        let mut response = Map::new();
        response.insert(CLAIM_SUBJECT.to_string(), Value::from(subject_id));
        for claim in claims {
            if claim.claim_type == CLAIM_SUBJECT {
                if claim.value != subject_id {
                    tracing::error!(subject_id, profile_sub = %claim.value, "profile service returned a different sub");
                    return Err(OAuthError::RuntimeError(
                        "Profile service returned incorrect subject value".to_string(),
                    ));
                }
                continue;
            }
            if !requested_claim_types.contains(&claim.claim_type) {
                continue;
            }
            let value = Value::from(claim.value);
            match response.get_mut(&claim.claim_type) {
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    response.insert(claim.claim_type, value);
                }
            }
        }
        Ok(response)
    }
}
