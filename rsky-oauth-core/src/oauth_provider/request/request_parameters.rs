use crate::oauth_provider::errors::OAuthError;
use std::collections::BTreeMap;

/// Raw form parameters of a token, revocation or device authorization request.
///
/// Parameters with an empty value are treated as absent. A repeated parameter keeps
/// its first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters(BTreeMap<String, String>);

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn from_form(body: &str) -> Result<Self, OAuthError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body).map_err(|e| {
            OAuthError::InvalidRequestError(format!("Malformed form body: {e}"))
        })?;
        Ok(pairs.into_iter().collect())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_insert_with(|| value.into());
    }

    /// The trimmed value, `None` if absent or blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The value, failing with `invalid_request` when it exceeds `max_length`.
    pub fn get_bounded(&self, name: &str, max_length: usize) -> Result<Option<&str>, OAuthError> {
        match self.get(name) {
            Some(value) if value.len() > max_length => Err(OAuthError::InvalidRequestError(
                format!("{name} too long"),
            )),
            other => Ok(other),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut parameters = RequestParameters::new();
        for (name, value) in iter {
            parameters.insert(name, value);
        }
        parameters
    }
}
