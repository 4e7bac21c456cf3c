use crate::oauth_provider::account::subject::Subject;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_types::OAuthErrorCode;
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome reported by pluggable grant validators (resource owner password and
/// extension grants).
#[derive(Debug, Clone, PartialEq)]
pub enum GrantValidationResult {
    Success {
        subject: Subject,
        /// Extra members merged into the token response
        custom_response: BTreeMap<String, Value>,
    },
    Error {
        error: OAuthErrorCode,
        description: Option<String>,
        custom_response: BTreeMap<String, Value>,
    },
}

impl GrantValidationResult {
    pub fn success(subject: Subject) -> Self {
        GrantValidationResult::Success {
            subject,
            custom_response: BTreeMap::new(),
        }
    }

    pub fn error(error: OAuthErrorCode, description: Option<String>) -> Self {
        GrantValidationResult::Error {
            error,
            description,
            custom_response: BTreeMap::new(),
        }
    }

    pub fn with_custom_response(mut self, name: impl Into<String>, value: Value) -> Self {
        match &mut self {
            GrantValidationResult::Success {
                custom_response, ..
            }
            | GrantValidationResult::Error {
                custom_response, ..
            } => {
                custom_response.insert(name.into(), value);
            }
        }
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GrantValidationResult::Error { .. })
    }

    /// Split into the subject and custom response, or the protocol error.
    pub fn into_result(self) -> Result<(Subject, BTreeMap<String, Value>), OAuthError> {
        match self {
            GrantValidationResult::Success {
                subject,
                custom_response,
            } => Ok((subject, custom_response)),
            GrantValidationResult::Error {
                error, description, ..
            } => Err(OAuthError::from_code(error, description)),
        }
    }
}
