use crate::oauth_provider::account::subject::{Claim, Subject};
use crate::oauth_provider::client::client::Client;
use std::collections::{BTreeMap, BTreeSet};

/// Why claims are being requested. Implementations may release different claims
/// per caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileDataCaller {
    ClaimsProviderAccessToken,
    ClaimsProviderIdentityToken,
    UserInfoEndpoint,
}

#[derive(Debug, Clone)]
pub struct ProfileDataRequest<'a> {
    pub subject: &'a Subject,
    pub client: &'a Client,
    pub caller: ProfileDataCaller,
    pub requested_claim_types: BTreeSet<String>,
}

/// Host-provided source of subject claims and account status.
#[async_trait::async_trait]
pub trait ProfileService: Send + Sync {
    async fn get_claims(&self, request: ProfileDataRequest<'_>) -> anyhow::Result<Vec<Claim>>;

    async fn is_active(&self, subject: &Subject, client: &Client) -> anyhow::Result<bool>;
}

/// Profile service backed by a fixed map of subject ids to claims. A subject is
/// active while it is present and not listed as disabled.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileService {
    claims: BTreeMap<String, Vec<Claim>>,
    inactive: BTreeSet<String>,
}

impl InMemoryProfileService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>, claims: Vec<Claim>) -> Self {
        self.claims.insert(subject_id.into(), claims);
        self
    }

    pub fn deactivate(mut self, subject_id: impl Into<String>) -> Self {
        self.inactive.insert(subject_id.into());
        self
    }
}

#[async_trait::async_trait]
impl ProfileService for InMemoryProfileService {
    async fn get_claims(&self, request: ProfileDataRequest<'_>) -> anyhow::Result<Vec<Claim>> {
        let claims = self
            .claims
            .get(&request.subject.subject_id)
            .map(|claims| {
                claims
                    .iter()
                    .filter(|claim| request.requested_claim_types.contains(&claim.claim_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(claims)
    }

    async fn is_active(&self, subject: &Subject, _client: &Client) -> anyhow::Result<bool> {
        Ok(self.claims.contains_key(&subject.subject_id)
            && !self.inactive.contains(&subject.subject_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filters_claims_by_requested_type() {
        let service = InMemoryProfileService::new().with_subject(
            "bob",
            vec![Claim::new("name", "Bob"), Claim::new("email", "bob@example.com")],
        );
        let subject = Subject::new("bob");
        let client = Client::new("client");
        let claims = service
            .get_claims(ProfileDataRequest {
                subject: &subject,
                client: &client,
                caller: ProfileDataCaller::UserInfoEndpoint,
                requested_claim_types: BTreeSet::from(["email".to_string()]),
            })
            .await
            .unwrap();
        assert_eq!(claims, vec![Claim::new("email", "bob@example.com")]);
    }

    #[tokio::test]
    async fn test_deactivated_subject_is_inactive() {
        let service = InMemoryProfileService::new()
            .with_subject("bob", vec![])
            .deactivate("bob");
        let client = Client::new("client");
        assert!(!service.is_active(&Subject::new("bob"), &client).await.unwrap());
        assert!(!service.is_active(&Subject::new("alice"), &client).await.unwrap());
    }
}
