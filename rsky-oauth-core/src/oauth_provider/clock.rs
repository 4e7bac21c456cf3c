use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Source of the current UTC time. Validators read it once per validation pass.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, seconds: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += Duration::seconds(seconds);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A lifetime in seconds as a `Duration`, saturating at `Duration::MAX`.
pub fn lifetime(seconds: u64) -> Duration {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// `start + seconds`, saturating at the latest representable instant.
pub fn expires_at(start: DateTime<Utc>, lifetime_seconds: u64) -> DateTime<Utc> {
    start
        .checked_add_signed(lifetime(lifetime_seconds))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `start + seconds` has passed at `now`.
pub fn has_expired(start: DateTime<Utc>, lifetime_seconds: u64, now: DateTime<Utc>) -> bool {
    now > expires_at(start, lifetime_seconds)
}
