use crate::oauth_provider::device::device_code::DeviceCode;
use crate::oauth_provider::errors::{OAuthError, StoreError};
use crate::oauth_provider::handle::hash_key;
use std::collections::BTreeMap;

const DEVICE_CODE_KEY_TYPE: &str = "device_code";

/// Storage for pending device authorizations, keyed by device code and indexed by
/// user code.
pub trait DeviceFlowStore: Send + Sync {
    /// Fails if the user code is already in use.
    fn store_device_authorization(
        &mut self,
        device_code: &str,
        user_code: &str,
        data: DeviceCode,
    ) -> Result<(), OAuthError>;

    fn find_by_user_code(&self, user_code: &str) -> Result<Option<DeviceCode>, OAuthError>;

    fn find_by_device_code(&self, device_code: &str) -> Result<Option<DeviceCode>, OAuthError>;

    fn update_by_user_code(&mut self, user_code: &str, data: DeviceCode) -> Result<(), OAuthError>;

    /// Remove and return the authorization. Of two concurrent callers at most one
    /// gets it.
    fn remove_by_device_code(&mut self, device_code: &str) -> Result<Option<DeviceCode>, OAuthError>;
}

struct DeviceFlowEntry {
    user_code: String,
    data: DeviceCode,
}

#[derive(Default)]
pub struct InMemoryDeviceFlowStore {
    // hashed device code -> entry
    entries: BTreeMap<String, DeviceFlowEntry>,
    // user code -> hashed device code
    user_codes: BTreeMap<String, String>,
}

impl InMemoryDeviceFlowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceFlowStore for InMemoryDeviceFlowStore {
    fn store_device_authorization(
        &mut self,
        device_code: &str,
        user_code: &str,
        data: DeviceCode,
    ) -> Result<(), OAuthError> {
        if self.user_codes.contains_key(user_code) {
            return Err(StoreError::Other("user code already in use".to_string()).into());
        }
        let key = hash_key(device_code, DEVICE_CODE_KEY_TYPE);
        self.user_codes.insert(user_code.to_string(), key.clone());
        self.entries.insert(
            key,
            DeviceFlowEntry {
                user_code: user_code.to_string(),
                data,
            },
        );
        Ok(())
    }

    fn find_by_user_code(&self, user_code: &str) -> Result<Option<DeviceCode>, OAuthError> {
        Ok(self
            .user_codes
            .get(user_code)
            .and_then(|key| self.entries.get(key))
            .map(|entry| entry.data.clone()))
    }

    fn find_by_device_code(&self, device_code: &str) -> Result<Option<DeviceCode>, OAuthError> {
        Ok(self
            .entries
            .get(&hash_key(device_code, DEVICE_CODE_KEY_TYPE))
            .map(|entry| entry.data.clone()))
    }

    fn update_by_user_code(&mut self, user_code: &str, data: DeviceCode) -> Result<(), OAuthError> {
        let entry = self
            .user_codes
            .get(user_code)
            .and_then(|key| self.entries.get_mut(key))
            .ok_or_else(|| StoreError::Other("unknown user code".to_string()))?;
        entry.data = data;
        Ok(())
    }

    fn remove_by_device_code(&mut self, device_code: &str) -> Result<Option<DeviceCode>, OAuthError> {
        let removed = self
            .entries
            .remove(&hash_key(device_code, DEVICE_CODE_KEY_TYPE));
        Ok(removed.map(|entry| {
            self.user_codes.remove(&entry.user_code);
            entry.data
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;

    #[test]
    fn test_lookup_by_both_codes() {
        let mut store = InMemoryDeviceFlowStore::new();
        let data = DeviceCode::new("client", BTreeSet::new(), Utc::now(), 300);
        store
            .store_device_authorization("dvc-1", "123456789", data.clone())
            .unwrap();
        assert_eq!(store.find_by_device_code("dvc-1").unwrap(), Some(data.clone()));
        assert_eq!(store.find_by_user_code("123456789").unwrap(), Some(data));
        assert!(store
            .store_device_authorization("dvc-2", "123456789", DeviceCode::new("client", BTreeSet::new(), Utc::now(), 300))
            .is_err());
    }

    #[test]
    fn test_remove_is_atomic_take() {
        let mut store = InMemoryDeviceFlowStore::new();
        let data = DeviceCode::new("client", BTreeSet::new(), Utc::now(), 300);
        store
            .store_device_authorization("dvc-1", "123456789", data)
            .unwrap();
        assert!(store.remove_by_device_code("dvc-1").unwrap().is_some());
        assert!(store.remove_by_device_code("dvc-1").unwrap().is_none());
        assert!(store.find_by_user_code("123456789").unwrap().is_none());
    }
}
