use crate::oauth_types::{OAuthErrorCode, OAuthTokenErrorResponse};

/// Failure of a persistence collaborator. These are infrastructure faults, never
/// protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to serialize grant data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("invalid_request: {0}")]
    InvalidRequestError(String),
    #[error("invalid_client: {0}")]
    InvalidClientError(String),
    #[error("invalid_grant: {0}")]
    InvalidGrantError(String),
    #[error("unauthorized_client: {0}")]
    UnauthorizedClientError(String),
    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantTypeError(String),
    #[error("invalid_scope: {0}")]
    InvalidScopeError(String),
    #[error("authorization_pending")]
    AuthorizationPendingError,
    #[error("slow_down")]
    SlowDownError,
    #[error("expired_token: {0}")]
    ExpiredTokenError(String),
    #[error("access_denied: {0}")]
    AccessDeniedError(String),
    #[error("invalid_token: {0}")]
    InvalidTokenError(String),
    #[error("insufficient_scope: {0}")]
    InsufficientScopeError(String),
    #[error("unsupported_token_type: {0}")]
    UnsupportedTokenTypeError(String),
    #[error(transparent)]
    StoreError(#[from] StoreError),
    #[error("runtime error: {0}")]
    RuntimeError(String),
}

impl OAuthError {
    /// Build a protocol error from a wire code, e.g. one returned by an extension
    /// grant validator.
    pub fn from_code(code: OAuthErrorCode, description: Option<String>) -> Self {
        let description = description.unwrap_or_default();
        match code {
            OAuthErrorCode::InvalidRequest => OAuthError::InvalidRequestError(description),
            OAuthErrorCode::InvalidClient => OAuthError::InvalidClientError(description),
            OAuthErrorCode::InvalidGrant => OAuthError::InvalidGrantError(description),
            OAuthErrorCode::UnauthorizedClient => OAuthError::UnauthorizedClientError(description),
            OAuthErrorCode::UnsupportedGrantType => {
                OAuthError::UnsupportedGrantTypeError(description)
            }
            OAuthErrorCode::InvalidScope => OAuthError::InvalidScopeError(description),
            OAuthErrorCode::AuthorizationPending => OAuthError::AuthorizationPendingError,
            OAuthErrorCode::SlowDown => OAuthError::SlowDownError,
            OAuthErrorCode::ExpiredToken => OAuthError::ExpiredTokenError(description),
            OAuthErrorCode::AccessDenied => OAuthError::AccessDeniedError(description),
            OAuthErrorCode::InvalidToken => OAuthError::InvalidTokenError(description),
            OAuthErrorCode::InsufficientScope => OAuthError::InsufficientScopeError(description),
            OAuthErrorCode::UnsupportedTokenType => {
                OAuthError::UnsupportedTokenTypeError(description)
            }
        }
    }

    /// The wire error code, or `None` for infrastructure failures that the host
    /// must turn into a server error.
    pub fn error_code(&self) -> Option<OAuthErrorCode> {
        let code = match self {
            OAuthError::InvalidRequestError(_) => OAuthErrorCode::InvalidRequest,
            OAuthError::InvalidClientError(_) => OAuthErrorCode::InvalidClient,
            OAuthError::InvalidGrantError(_) => OAuthErrorCode::InvalidGrant,
            OAuthError::UnauthorizedClientError(_) => OAuthErrorCode::UnauthorizedClient,
            OAuthError::UnsupportedGrantTypeError(_) => OAuthErrorCode::UnsupportedGrantType,
            OAuthError::InvalidScopeError(_) => OAuthErrorCode::InvalidScope,
            OAuthError::AuthorizationPendingError => OAuthErrorCode::AuthorizationPending,
            OAuthError::SlowDownError => OAuthErrorCode::SlowDown,
            OAuthError::ExpiredTokenError(_) => OAuthErrorCode::ExpiredToken,
            OAuthError::AccessDeniedError(_) => OAuthErrorCode::AccessDenied,
            OAuthError::InvalidTokenError(_) => OAuthErrorCode::InvalidToken,
            OAuthError::InsufficientScopeError(_) => OAuthErrorCode::InsufficientScope,
            OAuthError::UnsupportedTokenTypeError(_) => OAuthErrorCode::UnsupportedTokenType,
            OAuthError::StoreError(_) | OAuthError::RuntimeError(_) => return None,
        };
        Some(code)
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            OAuthError::InvalidRequestError(d)
            | OAuthError::InvalidClientError(d)
            | OAuthError::InvalidGrantError(d)
            | OAuthError::UnauthorizedClientError(d)
            | OAuthError::UnsupportedGrantTypeError(d)
            | OAuthError::InvalidScopeError(d)
            | OAuthError::ExpiredTokenError(d)
            | OAuthError::AccessDeniedError(d)
            | OAuthError::InvalidTokenError(d)
            | OAuthError::InsufficientScopeError(d)
            | OAuthError::UnsupportedTokenTypeError(d) => {
                if d.is_empty() {
                    None
                } else {
                    Some(d.as_str())
                }
            }
            _ => None,
        }
    }

    pub fn is_protocol_error(&self) -> bool {
        self.error_code().is_some()
    }

    /// The body sent to the client, if this is a protocol error.
    ///
    /// `invalid_client` never carries a description so that callers cannot tell an
    /// unknown client from a bad secret.
    pub fn to_error_response(&self) -> Option<OAuthTokenErrorResponse> {
        let code = self.error_code()?;
        let description = match code {
            OAuthErrorCode::InvalidClient => None,
            _ => self.description().map(str::to_string),
        };
        Some(OAuthTokenErrorResponse::new(code, description))
    }
}
