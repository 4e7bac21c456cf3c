use chrono::{DateTime, Utc};

pub trait ReplayStore: Send + Sync {
    /**
     * Returns true if the nonce has not been seen in the namespace within the time
     * frame. The namespace keeps one client's nonces from colliding with another's.
     *
     * @param timeframe expressed in seconds, counted from `now`.
     */
    fn unique(&mut self, namespace: &str, nonce: &str, timeframe: u64, now: DateTime<Utc>)
        -> bool;
}
