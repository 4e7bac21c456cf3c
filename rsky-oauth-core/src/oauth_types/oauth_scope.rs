use std::fmt;
use std::str::FromStr;

/// The `scope` request parameter as it appears on the wire.
///
/// From RFC 6749 section 3.3:
/// scope = scope-token *( SP scope-token )
/// scope-token = 1*( %x21 / %x23-5B / %x5D-7E )
///
/// Splitting is lenient about repeated separators; empty tokens are dropped by the
/// scope parser, not rejected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthScope(String);

impl OAuthScope {
    pub fn new(scope: impl Into<String>) -> Result<Self, OAuthScopeError> {
        let scope = scope.into();
        if scope.trim().is_empty() {
            return Err(OAuthScopeError::Empty);
        }
        Ok(Self(scope))
    }

    pub fn from_tokens<I, S>(tokens: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tokens
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Self::new(joined).ok()
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Iterate over the raw tokens, including empty ones produced by repeated spaces.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ')
    }
}

/// Returns true if every character is allowed in a scope token.
pub fn is_valid_scope_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| matches!(c as u32, 0x21 | 0x23..=0x5B | 0x5D..=0x7E))
}

impl AsRef<str> for OAuthScope {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OAuthScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors that can occur when creating an OAuthScope.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OAuthScopeError {
    #[error("Scope string cannot be empty")]
    Empty,
}

impl FromStr for OAuthScope {
    type Err = OAuthScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tokens() {
        for token in ["read", "read!@#$%^&*()_+-=[]{}|;:,.<>", "scope~`'"] {
            assert!(is_valid_scope_token(token), "token should be valid: {token}");
        }
    }

    #[test]
    fn test_invalid_tokens() {
        for token in ["", "read\\write", "read\"write", "read write", "\t"] {
            assert!(!is_valid_scope_token(token), "token should be invalid: {token:?}");
        }
    }

    #[test]
    fn test_iter_keeps_empty_tokens() {
        let scope = OAuthScope::new("read  write").unwrap();
        let tokens: Vec<&str> = scope.iter().collect();
        assert_eq!(tokens, vec!["read", "", "write"]);
    }

    #[test]
    fn test_from_tokens() {
        let scope = OAuthScope::from_tokens(["openid", "profile"]).unwrap();
        assert_eq!(scope.as_ref(), "openid profile");
        assert!(OAuthScope::from_tokens(Vec::<String>::new()).is_none());
    }

    #[test]
    fn test_empty() {
        assert_eq!(OAuthScope::new("  "), Err(OAuthScopeError::Empty));
    }
}
