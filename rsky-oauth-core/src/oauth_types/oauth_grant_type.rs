use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const GRANT_TYPE_DEVICE_CODE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// OAuth grant types accepted at the token endpoint, including extension grants
/// registered by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OAuthGrantType {
    /// Authorization code grant
    AuthorizationCode,
    /// Client credentials grant
    ClientCredentials,
    /// Resource owner password credentials grant
    Password,
    /// Refresh token grant
    RefreshToken,
    /// Device authorization grant (RFC 8628)
    DeviceCode,
    /// Any other grant, dispatched to a registered extension grant validator
    Extension(String),
}

impl OAuthGrantType {
    /// The grants with built-in validation rules
    pub fn standard() -> &'static [OAuthGrantType] {
        &[
            OAuthGrantType::AuthorizationCode,
            OAuthGrantType::ClientCredentials,
            OAuthGrantType::Password,
            OAuthGrantType::RefreshToken,
            OAuthGrantType::DeviceCode,
        ]
    }

    /// Get the wire identifier for this grant type
    pub fn as_str(&self) -> &str {
        match self {
            OAuthGrantType::AuthorizationCode => "authorization_code",
            OAuthGrantType::ClientCredentials => "client_credentials",
            OAuthGrantType::Password => "password",
            OAuthGrantType::RefreshToken => "refresh_token",
            OAuthGrantType::DeviceCode => GRANT_TYPE_DEVICE_CODE,
            OAuthGrantType::Extension(name) => name.as_str(),
        }
    }

    pub fn is_extension(&self) -> bool {
        matches!(self, OAuthGrantType::Extension(_))
    }

    /// Grants whose scopes were frozen at authorization time rather than requested
    /// fresh on the token request.
    pub fn uses_stored_scopes(&self) -> bool {
        matches!(
            self,
            OAuthGrantType::AuthorizationCode
                | OAuthGrantType::RefreshToken
                | OAuthGrantType::DeviceCode
        )
    }
}

impl fmt::Display for OAuthGrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a string into an OAuthGrantType fails.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid grant type: {0:?}")]
pub struct ParseGrantTypeError(String);

impl FromStr for OAuthGrantType {
    type Err = ParseGrantTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(OAuthGrantType::AuthorizationCode),
            "client_credentials" => Ok(OAuthGrantType::ClientCredentials),
            "password" => Ok(OAuthGrantType::Password),
            "refresh_token" => Ok(OAuthGrantType::RefreshToken),
            GRANT_TYPE_DEVICE_CODE => Ok(OAuthGrantType::DeviceCode),
            other if other.trim().is_empty() || other.contains(char::is_whitespace) => {
                Err(ParseGrantTypeError(s.to_string()))
            }
            other => Ok(OAuthGrantType::Extension(other.to_string())),
        }
    }
}

impl AsRef<str> for OAuthGrantType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for OAuthGrantType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OAuthGrantType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
