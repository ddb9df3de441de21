//! Per-key async locks.
//!
//! The idempotency cache alone cannot prevent two concurrent dispatches with
//! the same key from both missing and both calling the provider. Holding the
//! key's lock across check-call-store closes that race.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `key`, creating it on first use.
    pub fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        self.lock_map()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Drops the map entry once no other dispatch holds or awaits the lock.
    /// The caller must have released its guard before calling this.
    pub fn release(&self, key: &str, handle: Arc<AsyncMutex<()>>) {
        let mut map = self.lock_map();
        // Two strong references left (the map's and `handle`) means nobody
        // else is waiting; cloning requires the map mutex we hold.
        if Arc::strong_count(&handle) == 2 {
            map.remove(key);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock_map().len()
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_key_returns_same_lock() {
        let locks = KeyedLocks::new();
        let first = locks.lock_for("key-1");
        let second = locks.lock_for("key-1");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let locks = KeyedLocks::new();
        let a = locks.lock_for("a");
        let b = locks.lock_for("b");
        let _guard_a = a.lock().await;
        // Not blocked by the guard on "a".
        let _guard_b = b.try_lock().unwrap();
    }

    #[tokio::test]
    async fn test_release_drops_uncontended_entry() {
        let locks = KeyedLocks::new();
        let handle = locks.lock_for("key-1");
        {
            let _guard = handle.lock().await;
        }
        locks.release("key-1", handle);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_release_keeps_contended_entry() {
        let locks = KeyedLocks::new();
        let first = locks.lock_for("key-1");
        let second = locks.lock_for("key-1");
        locks.release("key-1", first);
        // `second` still references the lock, so the entry survives.
        assert_eq!(locks.len(), 1);
        locks.release("key-1", second);
        assert_eq!(locks.len(), 0);
    }
}
