use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::persisted_grant::{PersistedGrant, PersistedGrantFilter};
use chrono::{DateTime, Utc};

/// Key/value storage for grant artifacts.
///
/// `take` and `try_consume` must be atomic with respect to concurrent callers: two
/// concurrent `take`s of one key return the grant to at most one of them, and two
/// concurrent `try_consume`s succeed for at most one.
pub trait PersistedGrantStore: Send + Sync {
    /// Insert or replace the grant with the same key.
    fn store(&mut self, grant: PersistedGrant) -> Result<(), OAuthError>;

    fn get(&self, key: &str) -> Result<Option<PersistedGrant>, OAuthError>;

    fn get_all(&self, filter: &PersistedGrantFilter) -> Result<Vec<PersistedGrant>, OAuthError>;

    fn remove(&mut self, key: &str) -> Result<(), OAuthError>;

    fn remove_all(&mut self, filter: &PersistedGrantFilter) -> Result<(), OAuthError>;

    /// Read and delete in one step.
    fn take(&mut self, key: &str) -> Result<Option<PersistedGrant>, OAuthError>;

    /// Set the consumed time if it is not set yet. Returns false if the grant is
    /// missing or already consumed.
    fn try_consume(&mut self, key: &str, at: DateTime<Utc>) -> Result<bool, OAuthError>;
}

pub(crate) fn check_filter(filter: &PersistedGrantFilter) -> Result<(), OAuthError> {
    if filter.is_empty() {
        return Err(OAuthError::RuntimeError(
            "No filter values set on persisted grant filter".to_string(),
        ));
    }
    Ok(())
}
