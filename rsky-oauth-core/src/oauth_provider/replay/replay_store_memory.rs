use crate::oauth_provider::clock::expires_at;
use crate::oauth_provider::replay::replay_store::ReplayStore;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

pub struct ReplayStoreMemory {
    last_cleanup: Option<DateTime<Utc>>,
    nonces: BTreeMap<String, DateTime<Utc>>,
}

impl Default for ReplayStoreMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayStoreMemory {
    pub fn new() -> Self {
        ReplayStoreMemory {
            last_cleanup: None,
            nonces: Default::default(),
        }
    }

    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let due = match self.last_cleanup {
            None => true,
            Some(last) => last < now - Duration::minutes(1),
        };
        if due {
            self.nonces.retain(|_, expires| *expires >= now);
            self.last_cleanup = Some(now);
        }
    }
}

impl ReplayStore for ReplayStoreMemory {
    fn unique(
        &mut self,
        namespace: &str,
        nonce: &str,
        timeframe: u64,
        now: DateTime<Utc>,
    ) -> bool {
        self.cleanup(now);
        let key = format!("{namespace}:{nonce}");
        if let Some(expires) = self.nonces.get(&key) {
            if *expires >= now {
                return false;
            }
        }
        self.nonces
            .insert(key, expires_at(now, timeframe));
        true
    }
}
