//! Exact sliding-window-log admission.
//!
//! Each admitted request's timestamp is kept until it ages out of the
//! trailing window, so a decision is exact for every window of length
//! `window`, at the cost of O(entries in window) per check.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::config::RateLimitConfig;
use crate::limiter::clock::{Clock, SystemClock};
use crate::limiter::store::{lock_log, WindowStore};
use crate::observability::metrics;

/// Point-in-time view of one client's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Admitted requests still inside the window.
    pub used: u32,
    /// Quota per window.
    pub allowed: u32,
    pub window_minutes: u32,
    /// When the oldest in-window request ages out, or `now + window` if none.
    pub reset_time: DateTime<Utc>,
}

impl RateLimitSnapshot {
    pub fn remaining(&self) -> u32 {
        self.allowed.saturating_sub(self.used)
    }

    pub fn reset_epoch_secs(&self) -> i64 {
        self.reset_time.timestamp()
    }

    /// Whole seconds until `reset_time`, truncated and floored at zero.
    pub fn seconds_until_reset(&self, now: DateTime<Utc>) -> i64 {
        (self.reset_time - now).num_seconds().max(0)
    }
}

/// Per-client sliding-window rate limiter.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    store: Arc<WindowStore>,
    max_requests: u32,
    window_minutes: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    /// Build a limiter on the wall clock.
    pub fn new(max_requests: u32, window_minutes: u32) -> Self {
        Self::with_clock(max_requests, window_minutes, Arc::new(SystemClock))
    }

    pub fn with_clock(max_requests: u32, window_minutes: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(WindowStore::new()),
            max_requests,
            window_minutes,
            window: Duration::minutes(i64::from(window_minutes)),
            clock,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window_minutes)
    }

    /// Decide whether `key` may make a request now, recording it if so.
    ///
    /// Stale entries are pruned even when the request is denied.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now();
        let window_start = now - self.window;

        loop {
            let log = self.store.get_or_create(key);
            let mut log = lock_log(&log);
            if log.is_retired() {
                // The sweeper unlinked this log after we fetched it; use the live one.
                continue;
            }

            log.trim_before(window_start);
            let used = log.len();

            if used >= self.max_requests as usize {
                tracing::warn!(
                    client = %key,
                    used,
                    limit = self.max_requests,
                    window_minutes = self.window_minutes,
                    "Rate limit exceeded"
                );
                metrics::record_admission(false);
                return false;
            }

            log.push(now);
            tracing::info!(
                client = %key,
                used = used + 1,
                limit = self.max_requests,
                window_minutes = self.window_minutes,
                "Request admitted"
            );
            metrics::record_admission(true);
            return true;
        }
    }

    /// Current quota state for `key`. Never records a request and never
    /// creates an entry for an unknown client.
    pub fn rate_limit_info(&self, key: &str) -> RateLimitSnapshot {
        let now = self.clock.now();
        let window_start = now - self.window;

        let (used, oldest) = match self.store.get(key) {
            Some(log) => {
                let mut log = lock_log(&log);
                if log.is_retired() {
                    (0, None)
                } else {
                    log.trim_before(window_start);
                    (log.len(), log.oldest())
                }
            }
            None => (0, None),
        };

        RateLimitSnapshot {
            used: u32::try_from(used).unwrap_or(u32::MAX),
            allowed: self.max_requests,
            window_minutes: self.window_minutes,
            reset_time: oldest.map_or(now + self.window, |t| t + self.window),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_minutes(&self) -> u32 {
        self.window_minutes
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn store(&self) -> Arc<WindowStore> {
        Arc::clone(&self.store)
    }

    /// Number of clients currently holding state.
    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }
}
