use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::client::secret_parser::ParsedSecret;
use crate::oauth_provider::device::device_code::DeviceCode;
use crate::oauth_provider::request::authorization_code::AuthorizationCode;
use crate::oauth_provider::request::request_parameters::RequestParameters;
use crate::oauth_provider::resource::resources::ResourceValidationResult;
use crate::oauth_provider::token::refresh_token::RefreshToken;
use crate::oauth_types::OAuthGrantType;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A token request being validated. Each stage fills in its part; the value is
/// owned by one validation pass and only returned once every stage passed.
#[derive(Debug, Clone)]
pub struct ValidatedTokenRequest {
    pub raw: RequestParameters,
    pub client: Client,
    pub secret: ParsedSecret,
    pub grant_type: OAuthGrantType,
    /// Clock reading shared by every stage of the pass
    pub request_time: DateTime<Utc>,

    pub subject: Option<Subject>,
    pub session_id: Option<String>,
    /// Raw scope values the grant stage decided are being requested
    pub requested_scopes: BTreeSet<String>,
    pub validated_resources: ResourceValidationResult,

    pub authorization_code: Option<AuthorizationCode>,
    pub authorization_code_handle: Option<String>,
    pub code_verifier: Option<String>,

    pub refresh_token: Option<RefreshToken>,
    pub refresh_token_handle: Option<String>,

    pub device_code: Option<DeviceCode>,
    pub user_name: Option<String>,

    /// Members added by pluggable grant validators to the token response
    pub custom_response: BTreeMap<String, Value>,
}

impl ValidatedTokenRequest {
    pub fn new(
        raw: RequestParameters,
        client: Client,
        secret: ParsedSecret,
        grant_type: OAuthGrantType,
        request_time: DateTime<Utc>,
    ) -> Self {
        ValidatedTokenRequest {
            raw,
            client,
            secret,
            grant_type,
            request_time,
            subject: None,
            session_id: None,
            requested_scopes: BTreeSet::new(),
            validated_resources: ResourceValidationResult::default(),
            authorization_code: None,
            authorization_code_handle: None,
            code_verifier: None,
            refresh_token: None,
            refresh_token_handle: None,
            device_code: None,
            user_name: None,
            custom_response: BTreeMap::new(),
        }
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject.as_ref().map(|s| s.subject_id.as_str())
    }
}
