use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CLAIM_SUBJECT: &str = "sub";
pub const CLAIM_CLIENT_ID: &str = "client_id";
pub const CLAIM_SCOPE: &str = "scope";
pub const CLAIM_AUTH_TIME: &str = "auth_time";
pub const CLAIM_IDP: &str = "idp";
pub const CLAIM_AMR: &str = "amr";
pub const CLAIM_SESSION_ID: &str = "sid";
pub const CLAIM_JWT_ID: &str = "jti";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The authenticated resource owner a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication_methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<Claim>,
}

impl Subject {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            auth_time: None,
            identity_provider: None,
            authentication_methods: vec![],
            claims: vec![],
        }
    }

    pub fn with_auth_time(mut self, auth_time: DateTime<Utc>) -> Self {
        self.auth_time = Some(auth_time);
        self
    }

    pub fn with_authentication_method(mut self, method: impl Into<String>) -> Self {
        self.authentication_methods.push(method.into());
        self
    }

    pub fn with_claims(mut self, claims: Vec<Claim>) -> Self {
        self.claims = claims;
        self
    }

    /// Claims describing the authentication event, carried into issued tokens.
    pub fn authentication_claims(&self) -> Vec<Claim> {
        let mut claims = vec![Claim::new(CLAIM_SUBJECT, self.subject_id.clone())];
        if let Some(auth_time) = self.auth_time {
            claims.push(Claim::new(CLAIM_AUTH_TIME, auth_time.timestamp().to_string()));
        }
        if let Some(idp) = &self.identity_provider {
            claims.push(Claim::new(CLAIM_IDP, idp.clone()));
        }
        for amr in &self.authentication_methods {
            claims.push(Claim::new(CLAIM_AMR, amr.clone()));
        }
        claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_authentication_claims() {
        let auth_time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let subject = Subject::new("bob")
            .with_auth_time(auth_time)
            .with_authentication_method("pwd");
        let claims = subject.authentication_claims();
        assert_eq!(claims[0], Claim::new("sub", "bob"));
        assert!(claims.contains(&Claim::new("auth_time", auth_time.timestamp().to_string())));
        assert!(claims.contains(&Claim::new("amr", "pwd")));
    }
}
