use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::persisted_grant::{PersistedGrant, PersistedGrantFilter};
use crate::oauth_provider::grant::persisted_grant_store::{check_filter, PersistedGrantStore};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Grants kept in a map. Atomicity comes from the exclusive borrow taken by the
/// surrounding lock.
#[derive(Debug, Default)]
pub struct InMemoryPersistedGrantStore {
    grants: BTreeMap<String, PersistedGrant>,
}

impl InMemoryPersistedGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl PersistedGrantStore for InMemoryPersistedGrantStore {
    fn store(&mut self, grant: PersistedGrant) -> Result<(), OAuthError> {
        self.grants.insert(grant.key.clone(), grant);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<PersistedGrant>, OAuthError> {
        Ok(self.grants.get(key).cloned())
    }

    fn get_all(&self, filter: &PersistedGrantFilter) -> Result<Vec<PersistedGrant>, OAuthError> {
        check_filter(filter)?;
        Ok(self
            .grants
            .values()
            .filter(|grant| filter.matches(grant))
            .cloned()
            .collect())
    }

    fn remove(&mut self, key: &str) -> Result<(), OAuthError> {
        self.grants.remove(key);
        Ok(())
    }

    fn remove_all(&mut self, filter: &PersistedGrantFilter) -> Result<(), OAuthError> {
        check_filter(filter)?;
        self.grants.retain(|_, grant| !filter.matches(grant));
        Ok(())
    }

    fn take(&mut self, key: &str) -> Result<Option<PersistedGrant>, OAuthError> {
        Ok(self.grants.remove(key))
    }

    fn try_consume(&mut self, key: &str, at: DateTime<Utc>) -> Result<bool, OAuthError> {
        match self.grants.get_mut(key) {
            Some(grant) if grant.consumed_time.is_none() => {
                grant.consumed_time = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(key: &str, client_id: &str, subject_id: &str) -> PersistedGrant {
        PersistedGrant {
            key: key.to_string(),
            grant_type: "refresh_token".to_string(),
            subject_id: Some(subject_id.to_string()),
            session_id: None,
            client_id: client_id.to_string(),
            description: None,
            creation_time: Utc::now(),
            expiration: None,
            consumed_time: None,
            data: "{}".to_string(),
        }
    }

    #[test]
    fn test_take_is_read_and_delete() {
        let mut store = InMemoryPersistedGrantStore::new();
        store.store(grant("a", "client", "bob")).unwrap();
        assert!(store.take("a").unwrap().is_some());
        assert!(store.take("a").unwrap().is_none());
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_try_consume_once() {
        let mut store = InMemoryPersistedGrantStore::new();
        store.store(grant("a", "client", "bob")).unwrap();
        let now = Utc::now();
        assert!(store.try_consume("a", now).unwrap());
        assert!(!store.try_consume("a", now).unwrap());
        assert_eq!(store.get("a").unwrap().unwrap().consumed_time, Some(now));
        assert!(!store.try_consume("missing", now).unwrap());
    }

    #[test]
    fn test_filters() {
        let mut store = InMemoryPersistedGrantStore::new();
        store.store(grant("a", "client", "bob")).unwrap();
        store.store(grant("b", "other", "bob")).unwrap();
        store.store(grant("c", "client", "alice")).unwrap();

        let bob = PersistedGrantFilter::by_subject("bob");
        assert_eq!(store.get_all(&bob).unwrap().len(), 2);

        store.remove_all(&bob.clone().with_client("client")).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("b").unwrap().is_some());

        assert!(store.get_all(&PersistedGrantFilter::default()).is_err());
    }
}
