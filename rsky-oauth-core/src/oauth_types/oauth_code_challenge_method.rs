use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Code challenge methods for PKCE (Proof Key for Code Exchange).
///
/// RFC 7636 defines two methods:
/// - S256: SHA256 hash of the code verifier
/// - plain: The code verifier itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OAuthCodeChallengeMethod {
    #[serde(rename = "S256")]
    S256,
    #[serde(rename = "plain")]
    Plain,
}

impl OAuthCodeChallengeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthCodeChallengeMethod::S256 => "S256",
            OAuthCodeChallengeMethod::Plain => "plain",
        }
    }
}

/// RFC 7636 section 4.3: absent method means "plain".
impl Default for OAuthCodeChallengeMethod {
    fn default() -> Self {
        Self::Plain
    }
}

impl fmt::Display for OAuthCodeChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a string into an OAuthCodeChallengeMethod fails.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid code challenge method: {0}")]
pub struct ParseCodeChallengeMethodError(String);

impl FromStr for OAuthCodeChallengeMethod {
    type Err = ParseCodeChallengeMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S256" => Ok(OAuthCodeChallengeMethod::S256),
            "plain" => Ok(OAuthCodeChallengeMethod::Plain),
            _ => Err(ParseCodeChallengeMethodError(s.to_string())),
        }
    }
}

impl AsRef<str> for OAuthCodeChallengeMethod {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_plain() {
        assert_eq!(
            OAuthCodeChallengeMethod::default(),
            OAuthCodeChallengeMethod::Plain
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "S256".parse::<OAuthCodeChallengeMethod>().unwrap(),
            OAuthCodeChallengeMethod::S256
        );
        assert_eq!(
            "plain".parse::<OAuthCodeChallengeMethod>().unwrap(),
            OAuthCodeChallengeMethod::Plain
        );
        assert!("invalid".parse::<OAuthCodeChallengeMethod>().is_err());
        assert!("s256".parse::<OAuthCodeChallengeMethod>().is_err()); // Case sensitive
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&OAuthCodeChallengeMethod::Plain).unwrap();
        assert_eq!(json, "\"plain\"");
    }
}
