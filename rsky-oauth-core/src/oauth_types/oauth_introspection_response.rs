use serde::Serialize;

/// Response from a token introspection endpoint.
///
/// See RFC 7662 section 2.2 for introspection response details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuthIntrospectionResponse {
    pub active: bool,

    #[serde(flatten)]
    pub info: Option<ActiveTokenInfo>,
}

/// Information about an active token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveTokenInfo {
    /// Space-delimited scopes of the token visible to the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl OAuthIntrospectionResponse {
    pub fn inactive() -> Self {
        Self {
            active: false,
            info: None,
        }
    }

    pub fn active(info: ActiveTokenInfo) -> Self {
        Self {
            active: true,
            info: Some(info),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn token_info(&self) -> Option<&ActiveTokenInfo> {
        self.info.as_ref()
    }
}
