use crate::oauth_provider::clock::expires_at;
use crate::oauth_provider::device::device_code::DeviceCode;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Enforces the minimum interval between two polls of one device code.
pub trait DeviceFlowThrottlingService: Send + Sync {
    /// Returns true when the client polled too soon. Check and record happen in one
    /// step, so concurrent polls cannot both pass.
    fn should_slow_down(&mut self, device_code: &str, details: &DeviceCode, now: DateTime<Utc>)
        -> bool;
}

#[derive(Debug, Clone, Copy)]
struct PollRecord {
    last_seen: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

pub struct InMemoryDeviceFlowThrottlingService {
    interval_seconds: u64,
    polls: BTreeMap<String, PollRecord>,
}

impl InMemoryDeviceFlowThrottlingService {
    pub fn new(interval_seconds: u64) -> Self {
        InMemoryDeviceFlowThrottlingService {
            interval_seconds,
            polls: BTreeMap::new(),
        }
    }
}

impl DeviceFlowThrottlingService for InMemoryDeviceFlowThrottlingService {
    fn should_slow_down(
        &mut self,
        device_code: &str,
        details: &DeviceCode,
        now: DateTime<Utc>,
    ) -> bool {
        self.polls.retain(|_, record| record.expires_at > now);

        if let Some(record) = self.polls.get(device_code) {
            if now < expires_at(record.last_seen, self.interval_seconds) {
                // a too-soon poll does not move the window
                return true;
            }
        }

        self.polls.insert(
            device_code.to_string(),
            PollRecord {
                last_seen: now,
                expires_at: details.expiration(),
            },
        );
        false
    }
}
