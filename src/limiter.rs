use std::sync::Arc;

use crate::clock::Clock;
use crate::store::{CounterEntry, CounterStore};

// Identity windows
const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;

// Fixed per-IP policy: 1000 requests per rolling hour
const IP_MAX_REQUESTS: u32 = 1000;

// Outcome of one admission check
#[derive(Clone, Debug)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: i64,           // epoch ms when the window expires
    pub retry_after: Option<i64>, // seconds, set on denials
}

// Fixed-window rate limiter over a shared counter store. Per-key
// atomicity comes from the DashMap entry API - the shard write lock is
// held across the whole read-modify-write.
pub struct RateLimiter {
    store: Arc<CounterStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    // Core fixed-window check: create, increment, or deny on one counter.
    // A request hitting an expired entry starts a fresh window in place.
    // Over-limit requests are denied without incrementing the count.
    pub fn check_limit(&self, key: &str, window_ms: i64, max_requests: u32) -> RateLimitResult {
        let now = self.clock.now_ms();

        // fail safe: a zero limit or empty window denies everything
        // instead of admitting everything
        if max_requests == 0 || window_ms <= 0 {
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at: now,
                retry_after: Some(0),
            };
        }

        let mut entry = self
            .store
            .entries()
            .entry(key.to_string())
            .or_insert(CounterEntry {
                count: 0,
                reset_at: now + window_ms,
            });

        // window expired..? start a fresh one
        if entry.reset_at <= now {
            entry.count = 1;
            entry.reset_at = now + window_ms;
            return RateLimitResult {
                allowed: true,
                remaining: max_requests - 1,
                reset_at: entry.reset_at,
                retry_after: None,
            };
        }

        // under limit..? count it
        if entry.count < max_requests {
            entry.count += 1;
            return RateLimitResult {
                allowed: true,
                remaining: max_requests - entry.count,
                reset_at: entry.reset_at,
                retry_after: None,
            };
        }

        // over limit
        RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_at: entry.reset_at,
            retry_after: Some(retry_after_secs(entry.reset_at, now)),
        }
    }

    // Minute gate then hour gate. A minute denial short-circuits - the
    // hour counter is not touched. A request passing the minute gate has
    // consumed minute budget even if the hour gate then denies it: the
    // minute counter measures raw attempts, the hour counter is the
    // binding long-horizon quota.
    pub fn check_identity_limit(
        &self,
        identity: &str,
        per_minute: u32,
        per_hour: u32,
    ) -> RateLimitResult {
        let minute = self.check_limit(&format!("{}:minute", identity), MINUTE_MS, per_minute);
        if !minute.allowed {
            return minute;
        }
        self.check_limit(&format!("{}:hour", identity), HOUR_MS, per_hour)
    }

    pub fn check_origin_limit(&self, address: &str) -> RateLimitResult {
        self.check_limit(&format!("ip:{}", address), HOUR_MS, IP_MAX_REQUESTS)
    }
}

// seconds until the window resets, rounded up, never negative
fn retry_after_secs(reset_at: i64, now: i64) -> i64 {
    ((reset_at - now).max(0) + 999) / 1000
}
