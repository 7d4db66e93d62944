//! Periodic eviction of idle clients.
//!
//! # Responsibilities
//! - Trim entries older than `window + safety_margin`
//! - Remove clients whose log ends up empty
//! - Stop when the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as TimeDelta;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::RateLimitConfig;
use crate::limiter::clock::Clock;
use crate::limiter::store::WindowStore;
use crate::limiter::window::SlidingWindowLimiter;
use crate::observability::metrics;

/// Longest interval the timer is asked to wait; keeps `now + interval` representable.
const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub scanned: usize,
    pub evicted: usize,
}

pub struct EvictionSweeper {
    store: Arc<WindowStore>,
    clock: Arc<dyn Clock>,
    retention: TimeDelta,
    interval: Duration,
}

impl EvictionSweeper {
    pub fn new(limiter: &SlidingWindowLimiter, interval: Duration, safety_margin: Duration) -> Self {
        let margin = TimeDelta::from_std(safety_margin).unwrap_or(TimeDelta::MAX);
        Self {
            store: limiter.store(),
            clock: limiter.clock(),
            retention: limiter.window().checked_add(&margin).unwrap_or(TimeDelta::MAX),
            interval: interval.min(MAX_INTERVAL),
        }
    }

    pub fn from_config(limiter: &SlidingWindowLimiter, config: &RateLimitConfig) -> Self {
        Self::new(
            limiter,
            Duration::from_secs(config.sweep_interval_secs),
            Duration::from_secs(config.safety_margin_secs),
        )
    }

    /// Run one mark-and-remove pass.
    pub fn sweep_once(&self) -> SweepReport {
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(self.retention)
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);

        let mut scanned = 0;
        let mut idle = Vec::new();
        self.store.for_each_entry(|key, log| {
            scanned += 1;
            log.trim_before(cutoff);
            if log.is_empty() {
                idle.push(key.to_owned());
            }
        });

        // A key refilled between the scan and here survives the recheck.
        let evicted = idle
            .iter()
            .filter(|key| self.store.remove_if_empty(key))
            .count();

        metrics::record_evictions(evicted);
        metrics::record_tracked_clients(self.store.len());
        tracing::info!(scanned, evicted, remaining = self.store.len(), "Cleaned up idle rate limit entries");

        SweepReport { scanned, evicted }
    }

    /// Sweep every `interval` until shutdown. The first pass runs one interval after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            retention_minutes = self.retention.num_minutes(),
            "Eviction sweeper starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Eviction sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
