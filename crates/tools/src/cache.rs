//! A bounded, time-expiring key-value cache shared across sessions.
//!
//! Entries expire `ttl` after insertion. When the cache is full, expired
//! entries are purged first and then the oldest insertion is evicted.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// A capacity of zero is treated as one.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetch a live entry. Expired entries read as absent.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, e| !e.is_expired(now));
            if entries.len() >= self.capacity
                && let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().await.remove(key).map(|e| e.value)
    }

    /// Number of stored entries, including any not yet purged after expiry.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(10), 8);
        cache.insert("k", 1).await;
        assert_eq!(cache.get(&"k").await, Some(1));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get(&"k").await, Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&"k").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn full_cache_evicts_oldest() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.insert("a", 1).await;
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.insert("b", 2).await;
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.insert("c", 3).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&"a").await, None);
        assert_eq!(cache.get(&"c").await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn full_cache_purges_expired_first() {
        let cache = TtlCache::new(Duration::from_secs(5), 2);
        cache.insert("stale", 0).await;
        tokio::time::advance(Duration::from_secs(4)).await;
        cache.insert("fresh", 1).await;
        tokio::time::advance(Duration::from_secs(2)).await;
        cache.insert("new", 2).await;

        assert_eq!(cache.get(&"fresh").await, Some(1));
        assert_eq!(cache.get(&"new").await, Some(2));
    }

    #[tokio::test]
    async fn overwrite_does_not_evict() {
        let cache = TtlCache::new(Duration::from_secs(60), 1);
        cache.insert("a", 1).await;
        cache.insert("a", 2).await;
        assert_eq!(cache.get(&"a").await, Some(2));
        assert_eq!(cache.remove(&"a").await, Some(2));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_writers() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60), 1000));
        let mut handles = Vec::new();
        for i in 0..50 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.insert(i, i * 2).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(cache.len().await, 50);
        assert_eq!(cache.get(&21).await, Some(42));
    }
}
