//! Bounded idempotency cache for deduplicating caller send requests.
//!
//! Keyed by a caller-supplied idempotency key; stores only terminal dispatch
//! outcomes. Eviction is strictly FIFO by first-insert order, independent of
//! access recency or later overwrites.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::provider::SendResponse;

/// Default maximum number of cached entries.
pub const MAX_SIZE: usize = 10_000;

/// A terminal dispatch outcome stored under an idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub status_code: u16,
    pub response: SendResponse,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CachedEntry>,
    /// Keys in first-insert order; front is the next eviction candidate.
    order: VecDeque<String>,
}

/// Bounded key→outcome store with FIFO eviction.
///
/// All operations are total and atomic with respect to each other; a reader
/// never observes the cache between an eviction and the insert that forced it.
#[derive(Debug)]
pub struct IdempotencyCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl Default for IdempotencyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IdempotencyCache {
    /// Creates a cache with the default capacity of [`MAX_SIZE`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_SIZE)
    }

    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Looks up the stored outcome for `key`. No side effects.
    pub fn get(&self, key: &str) -> Option<CachedEntry> {
        self.lock().entries.get(key).cloned()
    }

    /// Inserts or overwrites the outcome for `key`.
    ///
    /// Inserting a new key at capacity first evicts the oldest-inserted key.
    /// Overwriting an existing key keeps its original position in the
    /// eviction order.
    pub fn set(&self, key: &str, status_code: u16, response: SendResponse) {
        let mut inner = self.lock();
        if !inner.entries.contains_key(key) {
            if inner.entries.len() >= self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                }
            }
            inner.order.push_back(key.to_string());
        }
        inner.entries.insert(
            key.to_string(),
            CachedEntry {
                status_code,
                response,
            },
        );
    }

    /// Removes all entries. Used for test isolation, not in request flow.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // The cache never panics while holding the lock, so poisoning cannot
        // occur in practice.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
