//! Failed-login counter cache.
//!
//! Entries are keyed by account identifier and hold the number of consecutive
//! failures since the last success. Every write pushes the entry's expiry out
//! by the policy window. The cache is capped; once full, the least-recently
//! written entry is dropped first so a spray across many accounts cannot grow
//! memory without bound.
//!
//! Increments run under the DashMap shard lock for the key, so concurrent
//! failures against one account never lose updates.
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::services::clock::SharedClock;

#[derive(Debug, Clone, Copy)]
pub struct ThrottlePolicy {
    /// Failures at or above this count mean the limit is exceeded.
    pub max_attempts: u32,
    /// Entry lifetime after its last write.
    pub window: Duration,
    /// Maximum number of tracked accounts.
    pub capacity: usize,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(15),
            capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AttemptEntry {
    count: u32,
    expires_at: DateTime<Utc>,
    // Monotonic write stamp; the smallest one is evicted first.
    written: u64,
}

impl AttemptEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

pub struct AttemptThrottle {
    policy: ThrottlePolicy,
    entries: DashMap<String, AttemptEntry>,
    write_seq: AtomicU64,
    clock: SharedClock,
}

impl std::fmt::Debug for AttemptThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptThrottle")
            .field("policy", &self.policy)
            .field("tracked", &self.entries.len())
            .finish()
    }
}

impl AttemptThrottle {
    pub fn new(policy: ThrottlePolicy, clock: SharedClock) -> Self {
        Self {
            policy,
            entries: DashMap::new(),
            write_seq: AtomicU64::new(0),
            clock,
        }
    }

    pub fn policy(&self) -> ThrottlePolicy {
        self.policy
    }

    /// Count one more failure for `account` and return the new count.
    pub fn record_failure(&self, account: &str) -> u32 {
        let now = self.clock.now();

        let count = {
            let mut entry = self
                .entries
                .entry(account.to_string())
                .or_insert(AttemptEntry {
                    count: 0,
                    expires_at: now,
                    written: 0,
                });
            if !entry.is_live(now) {
                entry.count = 0;
            }
            entry.count = entry.count.saturating_add(1);
            entry.expires_at = now + self.policy.window;
            entry.written = self.write_seq.fetch_add(1, Ordering::Relaxed);
            entry.count
        };

        if count >= self.policy.max_attempts {
            warn!(account = %account, attempts = count, "login attempt limit reached");
        } else {
            debug!(account = %account, attempts = count, "failed login recorded");
        }

        self.enforce_capacity();
        count
    }

    /// Forget `account`. No-op when it is not tracked.
    pub fn record_success(&self, account: &str) {
        if self.entries.remove(account).is_some() {
            debug!(account = %account, "login attempts cleared");
        }
    }

    pub fn has_exceeded_limit(&self, account: &str) -> bool {
        self.attempts(account) >= self.policy.max_attempts
    }

    /// Current failure count; 0 for untracked or expired accounts.
    pub fn attempts(&self, account: &str) -> u32 {
        let now = self.clock.now();
        let snapshot = self.entries.get(account).map(|e| *e.value());
        match snapshot {
            Some(entry) if entry.is_live(now) => entry.count,
            Some(_) => {
                self.entries.remove_if(account, |_, e| !e.is_live(now));
                0
            }
            None => 0,
        }
    }

    /// Drop every expired entry; returns how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn enforce_capacity(&self) {
        while self.entries.len() > self.policy.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.value().written)
                .map(|e| (e.key().clone(), e.value().written));

            let Some((account, written)) = oldest else {
                break;
            };
            if self
                .entries
                .remove_if(&account, |_, e| e.written == written)
                .is_some()
            {
                debug!(account = %account, "evicted login attempt entry (capacity)");
            }
        }
    }
}

/// Periodically purge expired entries so idle accounts do not linger until eviction.
pub fn spawn_sweeper(throttle: Arc<AttemptThrottle>, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let purged = throttle.purge_expired();
            if purged > 0 {
                debug!(purged, "purged expired login attempt entries");
            }
        }
    })
}
