use serde::{Deserialize, Serialize};
use std::fmt;

/// A single requested scope, split into its name and optional parameter, e.g.
/// `transaction:42` has the name `transaction` and the parameter `42`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParsedScopeValue {
    pub raw_value: String,
    pub parsed_name: String,
    pub parameter: Option<String>,
}

impl ParsedScopeValue {
    pub fn new(raw_value: impl Into<String>) -> Self {
        let raw_value = raw_value.into();
        Self {
            parsed_name: raw_value.clone(),
            raw_value,
            parameter: None,
        }
    }

    pub fn with_parameter(
        raw_value: impl Into<String>,
        parsed_name: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self {
            raw_value: raw_value.into(),
            parsed_name: parsed_name.into(),
            parameter: Some(parameter.into()),
        }
    }

    /// Parameterized scopes carry per-request data and cannot be remembered in a
    /// consent.
    pub fn is_parameterized(&self) -> bool {
        self.parsed_name != self.raw_value
    }
}

impl fmt::Display for ParsedScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_value)
    }
}
