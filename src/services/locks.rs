// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Keyed async mutexes whose map entries live only while in use.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One mutex per key, created on first use.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    map: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Held lock for one key. Dropping it releases the mutex and removes the
/// map entry when no other task holds or awaits it.
pub struct KeyedGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    map: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyedGuard {
        // Clone the Arc out so the shard lock is not held across the await.
        let lock = self
            .map
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        KeyedGuard {
            guard: Some(lock.lock_owned().await),
            key: key.to_string(),
            map: self.map.clone(),
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.map
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entry_outlives_first_holder_while_awaited() {
        let locks = KeyedLocks::new();

        let first = locks.lock("k").await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _second = locks.lock("k").await;
            })
        };
        tokio::task::yield_now().await;

        drop(first);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_map_empty_after_concurrent_use() {
        let locks = KeyedLocks::new();

        let mut handles = Vec::new();
        for i in 0..40 {
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&format!("k{}", i % 4)).await;
                tokio::task::yield_now().await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_serializes_same_key() {
        let locks = KeyedLocks::new();
        let counter = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("same").await;
                counter.lock().await.push(i);
                tokio::task::yield_now().await;
                let mut seen = counter.lock().await;
                // Nobody else pushed while we held the key.
                assert_eq!(seen.last(), Some(&i));
                seen.push(i);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(counter.lock().await.len(), 10);
    }
}
