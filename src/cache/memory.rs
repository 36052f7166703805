//! In-process cache backend
//!
//! Uses `DashMap` so concurrent lookups for different keys never contend on
//! a single lock. Deadlines use `tokio::time::Instant`, which lets tests
//! drive expiry with a paused clock.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::backend::{CacheBackend, CacheError};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Thread-safe in-memory backend keyed by cache key.
///
/// Every write also drops whatever has expired since the previous write, so
/// keys that are never read again do not accumulate. A lookup of an expired
/// key removes it as well.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<DashMap<String, MemoryEntry>>,
    /// Deadlines of written entries, soonest first; may hold stale deadlines
    /// for keys that were since overwritten or deleted
    deadlines: Arc<Mutex<BinaryHeap<Reverse<(Instant, String)>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry whose deadline is at or before `now`
    fn purge_expired(&self, now: Instant) {
        let due: Vec<String> = {
            let Ok(mut deadlines) = self.deadlines.lock() else {
                return;
            };
            let mut due = Vec::new();
            while deadlines.peek().is_some_and(|Reverse((at, _))| *at <= now) {
                if let Some(Reverse((_, key))) = deadlines.pop() {
                    due.push(key);
                }
            }
            due
        };

        // Only remove if the entry is really expired: the key may have been
        // written again with a later deadline.
        for key in due {
            self.entries.remove_if(&key, |_, entry| entry.expires_at <= now);
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }

        // The read guard above is released before removing.
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            CacheError::InvalidArgument(format!("ttl {:?} is too large", ttl))
        })?;

        self.purge_expired(now);

        self.entries
            .insert(key.to_string(), MemoryEntry { value, expires_at });
        if let Ok(mut deadlines) = self.deadlines.lock() {
            deadlines.push(Reverse((expires_at, key.to_string())));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}
