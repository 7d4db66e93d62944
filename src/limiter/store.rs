//! Concurrent per-client request history.
//!
//! # Locking
//! Two levels: the `DashMap` shard lock guards structure (insert, lookup,
//! remove) and each [`RequestLog`] sits behind its own `Mutex`. Admission
//! checks clone the log's `Arc` out of the map and release the shard before
//! locking the log, so unrelated clients never wait on each other. The only
//! path that holds both is [`WindowStore::remove_if_empty`], always in the
//! order shard → log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::observability::metrics;

/// Timestamps of one client's admitted requests, oldest first.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: VecDeque<DateTime<Utc>>,
    /// Set once the log has been unlinked from the store.
    retired: bool,
}

impl RequestLog {
    /// Drop every entry strictly older than `cutoff`. Returns how many were removed.
    pub fn trim_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        while self.entries.front().is_some_and(|t| *t < cutoff) {
            self.entries.pop_front();
        }
        before - self.entries.len()
    }

    pub fn push(&mut self, at: DateTime<Utc>) {
        self.entries.push_back(at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.entries.front().copied()
    }

    /// A retired log is no longer reachable from the store; writes to it would be lost.
    pub fn is_retired(&self) -> bool {
        self.retired
    }
}

/// Shared handle to one client's log.
pub type SharedLog = Arc<Mutex<RequestLog>>;

/// Lock a log. A poisoned mutex means a panic happened mid-mutation, which
/// leaves the log's ordering invariant unknown, so it is treated as fatal.
pub fn lock_log(log: &SharedLog) -> MutexGuard<'_, RequestLog> {
    log.lock().expect("request log mutex poisoned")
}

/// Map from client key to request log. Owns all limiter state.
#[derive(Debug, Default)]
pub struct WindowStore {
    entries: DashMap<String, SharedLog>,
}

impl WindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the log for `key`, inserting an empty one if absent.
    ///
    /// Concurrent callers for the same key always receive the same log.
    pub fn get_or_create(&self, key: &str) -> SharedLog {
        if let Some(log) = self.entries.get(key) {
            return Arc::clone(log.value());
        }
        let log = match self.entries.entry(key.to_owned()) {
            Entry::Occupied(entry) => return Arc::clone(entry.get()),
            Entry::Vacant(entry) => Arc::clone(entry.insert(SharedLog::default()).value()),
        };
        // Shard guard is released; `len` takes every shard's read lock.
        metrics::record_tracked_clients(self.entries.len());
        log
    }

    /// Fetch the log for `key` without creating one.
    pub fn get(&self, key: &str) -> Option<SharedLog> {
        self.entries.get(key).map(|log| Arc::clone(log.value()))
    }

    /// Remove `key` only if its log is still empty, marking the log retired.
    ///
    /// The emptiness check runs under the log's lock while the shard is held,
    /// so a request admitted after the sweeper's scan keeps its entry.
    pub fn remove_if_empty(&self, key: &str) -> bool {
        self.entries
            .remove_if(key, |_, log| {
                let mut log = lock_log(log);
                if log.is_empty() {
                    log.retired = true;
                    true
                } else {
                    false
                }
            })
            .is_some()
    }

    /// Visit every entry with its log locked.
    pub fn for_each_entry<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &mut RequestLog),
    {
        for entry in self.entries.iter() {
            let mut log = lock_log(entry.value());
            visit(entry.key(), &mut log);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
