use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents the type of an issued access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OAuthTokenType {
    Bearer,
}

impl fmt::Display for OAuthTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid token type: {0}")]
pub struct ParseTokenTypeError(String);

impl FromStr for OAuthTokenType {
    type Err = ParseTokenTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bearer" => Ok(OAuthTokenType::Bearer),
            _ => Err(ParseTokenTypeError(s.to_string())),
        }
    }
}

impl AsRef<str> for OAuthTokenType {
    fn as_ref(&self) -> &str {
        match self {
            OAuthTokenType::Bearer => "Bearer",
        }
    }
}

/// The `token_type_hint` of revocation and introspection requests (RFC 7009).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthTokenTypeHint {
    AccessToken,
    RefreshToken,
}

impl FromStr for OAuthTokenTypeHint {
    type Err = ParseTokenTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access_token" => Ok(OAuthTokenTypeHint::AccessToken),
            "refresh_token" => Ok(OAuthTokenTypeHint::RefreshToken),
            _ => Err(ParseTokenTypeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(OAuthTokenType::Bearer.to_string(), "Bearer");
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(
            "bearer".parse::<OAuthTokenType>().unwrap(),
            OAuthTokenType::Bearer
        );
        assert!("mac".parse::<OAuthTokenType>().is_err());
    }

    #[test]
    fn test_hint() {
        assert_eq!(
            "refresh_token".parse::<OAuthTokenTypeHint>().unwrap(),
            OAuthTokenTypeHint::RefreshToken
        );
        assert!("id_token".parse::<OAuthTokenTypeHint>().is_err());
    }
}
