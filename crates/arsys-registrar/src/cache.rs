//! Read-through cache for fetched envelopes.
//!
//! Entries live as long as the cache itself. Nothing evicts them: mutating
//! calls do not refresh what an earlier read stored, so readers may observe
//! stale data until [`ReadThroughCache::clear`] is called.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use tokio::sync::Mutex;

pub struct ReadThroughCache<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for ReadThroughCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or run `fetch` and store its
    /// result. The lock is held across the fetch, so concurrent callers
    /// asking for the same key trigger a single fetch. Failed fetches are not
    /// stored.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(value) = entries.get(key) {
            return Ok(value.clone());
        }
        let value = fetch().await?;
        entries.insert(key.clone(), value.clone());
        Ok(value)
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn insert(&self, key: K, value: V) {
        self.entries.lock().await.insert(key, value);
    }

    pub async fn contains(&self, key: &K) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_read_is_a_hit() {
        let cache: ReadThroughCache<String, u32> = ReadThroughCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_try_fetch(&"a".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(7)
                })
                .await
                .expect("fetched");
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn failures_are_not_stored() {
        let cache: ReadThroughCache<u8, u8> = ReadThroughCache::new();
        let err = cache
            .get_or_try_fetch(&1, || async { Err::<u8, _>("boom") })
            .await;
        assert_eq!(err, Err("boom"));
        assert!(!cache.contains(&1).await);

        let ok = cache.get_or_try_fetch(&1, || async { Ok::<_, &str>(3) }).await;
        assert_eq!(ok, Ok(3));
    }

    #[tokio::test]
    async fn insert_overwrites_and_clear_resets() {
        let cache: ReadThroughCache<u8, &str> = ReadThroughCache::new();
        cache.insert(1, "old").await;
        cache.insert(1, "new").await;
        assert_eq!(cache.get(&1).await, Some("new"));
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
