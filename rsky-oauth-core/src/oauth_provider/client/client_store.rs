use crate::oauth_provider::client::client::Client;
use crate::oauth_provider::errors::OAuthError;
use std::collections::BTreeMap;

pub trait ClientStore: Send + Sync {
    fn find_client_by_id(&self, client_id: &str) -> Result<Option<Client>, OAuthError>;
}

#[derive(Debug, Default)]
pub struct InMemoryClientStore {
    clients: BTreeMap<String, Client>,
}

impl InMemoryClientStore {
    pub fn new(clients: Vec<Client>) -> Self {
        InMemoryClientStore {
            clients: clients
                .into_iter()
                .map(|client| (client.client_id.clone(), client))
                .collect(),
        }
    }

    pub fn insert(&mut self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }
}

impl ClientStore for InMemoryClientStore {
    fn find_client_by_id(&self, client_id: &str) -> Result<Option<Client>, OAuthError> {
        Ok(self.clients.get(client_id).cloned())
    }
}

/// Look up a client that exists and is enabled.
pub fn find_enabled_client(
    store: &dyn ClientStore,
    client_id: &str,
) -> Result<Option<Client>, OAuthError> {
    Ok(store
        .find_client_by_id(client_id)?
        .filter(|client| client.enabled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_client_is_not_found() {
        let mut disabled = Client::new("disabled");
        disabled.enabled = false;
        let store = InMemoryClientStore::new(vec![Client::new("client"), disabled]);
        assert!(find_enabled_client(&store, "client").unwrap().is_some());
        assert!(find_enabled_client(&store, "disabled").unwrap().is_none());
        assert!(store.find_client_by_id("disabled").unwrap().is_some());
        assert!(find_enabled_client(&store, "unknown").unwrap().is_none());
    }
}
