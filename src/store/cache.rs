//! Time-bounded result cache
//!
//! Entries expire after a fixed TTL and are evicted lazily on the next
//! lookup of the same key; there is no background sweep. The cache owns
//! its entries: values are cloned out, so no caller ever holds a
//! reference into the map, and concurrent writes to one key replace the
//! entry wholesale (last-writer-wins).

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    cached_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh value for the key, if any. Expired entries are removed here.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.cached_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Read-through lookup: a fresh entry is returned without invoking
    /// `compute`; otherwise the computed value is stored and returned.
    /// Failed computations are not cached.
    pub async fn get_or_try_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_hit_skips_compute() {
        let cache: TtlCache<&str, i32> = TtlCache::new(Duration::from_secs(30));
        let mut calls = 0;

        for _ in 0..3 {
            let value = cache
                .get_or_try_compute("k", || {
                    calls += 1;
                    async { Ok::<_, ()>(7) }
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_recomputed() {
        let cache: TtlCache<&str, i32> = TtlCache::new(Duration::from_millis(10));
        cache.insert("k", 1);
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get(&"k"), None);

        let value = cache
            .get_or_try_compute("k", || async { Ok::<_, ()>(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_failed_compute_is_not_cached() {
        let cache: TtlCache<&str, i32> = TtlCache::new(Duration::from_secs(30));

        let err = cache
            .get_or_try_compute("k", || async { Err::<i32, _>("boom") })
            .await;
        assert!(err.is_err());

        let value = cache
            .get_or_try_compute("k", || async { Ok::<_, &str>(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_insert_replaces_wholesale() {
        let cache: TtlCache<&str, Vec<i32>> = TtlCache::new(Duration::from_secs(30));
        cache.insert("k", vec![1]);
        cache.insert("k", vec![2, 3]);
        assert_eq!(cache.get(&"k"), Some(vec![2, 3]));
    }
}
