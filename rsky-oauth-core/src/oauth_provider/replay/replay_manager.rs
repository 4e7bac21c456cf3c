use crate::oauth_provider::clock::Clock;
use crate::oauth_provider::constants::CLIENT_ASSERTION_MAX_AGE;
use crate::oauth_provider::replay::replay_store::ReplayStore;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct ReplayManager {
    replay_store: Arc<RwLock<dyn ReplayStore>>,
    clock: Arc<dyn Clock>,
}

impl ReplayManager {
    pub fn new(replay_store: Arc<RwLock<dyn ReplayStore>>, clock: Arc<dyn Clock>) -> Self {
        ReplayManager {
            replay_store,
            clock,
        }
    }

    /// Client assertion `jti` values may be used once per client.
    pub async fn unique_auth(&self, jti: &str, client_id: &str) -> bool {
        let now = self.clock.now();
        let mut replay_store = self.replay_store.write().await;
        replay_store.unique(
            format!("Auth@{client_id}").as_str(),
            jti,
            as_time_frame(CLIENT_ASSERTION_MAX_AGE),
            now,
        )
    }
}

// 10% extra time for security
fn as_time_frame(time_frame: u64) -> u64 {
    time_frame + time_frame.div_ceil(10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth_provider::clock::FixedClock;
    use crate::oauth_provider::replay::replay_store_memory::ReplayStoreMemory;
    use chrono::Utc;

    fn create_replay_manager() -> ReplayManager {
        let replay_store = Arc::new(RwLock::new(ReplayStoreMemory::new()));
        ReplayManager::new(replay_store, Arc::new(FixedClock::new(Utc::now())))
    }

    #[tokio::test]
    async fn test_unique_auth() {
        let replay_manager = create_replay_manager();
        let jti = "h6cir8v1iw:1jmosfp4komez";
        assert!(replay_manager.unique_auth(jti, "client").await);
        assert!(!replay_manager.unique_auth(jti, "client").await);
        assert!(replay_manager.unique_auth(jti, "other").await);
    }

    #[test]
    fn test_time_frame_has_margin() {
        assert_eq!(as_time_frame(300), 330);
    }
}
