use crate::oauth_provider::scope::parsed_scope_value::ParsedScopeValue;
use crate::oauth_types::is_valid_scope_token;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedScopeValidationError {
    pub raw_value: String,
    pub error: String,
}

/// Outcome of parsing a set of scope tokens. All collections are ordered sets, so
/// two results built from the same tokens in a different order compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedScopesResult {
    pub parsed_scopes: BTreeSet<ParsedScopeValue>,
    pub errors: BTreeSet<ParsedScopeValidationError>,
    /// Tokens that appeared more than once; the first occurrence is kept
    pub duplicates: BTreeSet<String>,
}

impl ParsedScopesResult {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn raw_values(&self) -> BTreeSet<String> {
        self.parsed_scopes
            .iter()
            .map(|scope| scope.raw_value.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeParser;

impl ScopeParser {
    pub fn new() -> Self {
        ScopeParser
    }

    /// Parse a space-delimited scope string.
    pub fn parse_scope_string(&self, scope: &str) -> ParsedScopesResult {
        self.parse_scope_values(scope.split(' '))
    }

    pub fn parse_scope_values<I, S>(&self, scopes: I) -> ParsedScopesResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = ParsedScopesResult::default();
        let mut seen = BTreeSet::new();
        for token in scopes {
            let token = token.as_ref();
            if token.is_empty() {
                continue;
            }
            if !seen.insert(token.to_string()) {
                result.duplicates.insert(token.to_string());
                continue;
            }
            match parse_scope_value(token) {
                Ok(value) => {
                    result.parsed_scopes.insert(value);
                }
                Err(error) => {
                    result.errors.insert(ParsedScopeValidationError {
                        raw_value: token.to_string(),
                        error: error.to_string(),
                    });
                }
            }
        }
        result
    }
}

fn parse_scope_value(token: &str) -> Result<ParsedScopeValue, &'static str> {
    if token.trim().is_empty() {
        return Err("malformed scope: whitespace only");
    }
    if !is_valid_scope_token(token) {
        return Err("malformed scope: invalid character");
    }
    match token.split_once(':') {
        None => Ok(ParsedScopeValue::new(token)),
        Some((name, parameter)) => {
            if name.is_empty() || parameter.is_empty() {
                return Err("malformed scope: empty name or parameter");
            }
            Ok(ParsedScopeValue::with_parameter(token, name, parameter))
        }
    }
}
