/// Content-addressed result cache
///
/// Write-through cache of computed strategies keyed by request fingerprint.
/// Store unavailability and store errors collapse to a cache miss; the
/// orchestrator just recomputes. No negative caching.
use crate::{
    cache::{categories, VolatileStore},
    strategy::StrategyResult,
};
use std::sync::Arc;
use tracing::warn;

pub struct ResultCache {
    store: Option<Arc<dyn VolatileStore>>,
    ttl_secs: u64,
}

impl ResultCache {
    pub fn new(store: Option<Arc<dyn VolatileStore>>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    /// Look up a previously computed result. Any failure reads as a miss;
    /// an entry that no longer deserializes is dropped.
    pub async fn get(&self, fingerprint: &str) -> Option<StrategyResult> {
        let store = self.store.as_ref()?;

        let json = match store.get_value(categories::STRATEGY, fingerprint).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!("Result cache read failed, treating as miss: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Corrupted cache entry {}, dropping: {}", fingerprint, e);
                let _ = store.delete(categories::STRATEGY, fingerprint).await;
                None
            }
        }
    }

    /// Store a computed result with the configured TTL. Best-effort.
    pub async fn put(&self, fingerprint: &str, result: &StrategyResult) {
        let Some(store) = &self.store else {
            return;
        };

        let json = match serde_json::to_string(result) {
            Ok(json) => json,
            Err(e) => {
                warn!("Result serialization for cache failed: {}", e);
                return;
            }
        };

        if let Err(e) = store
            .set_value(categories::STRATEGY, fingerprint, json, self.ttl_secs)
            .await
        {
            warn!("Result cache write failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemoryStore;
    use crate::strategy::{fallback, StrategyInput};

    fn input() -> StrategyInput {
        StrategyInput {
            goal: "Grow newsletter subscribers".to_string(),
            audience: "small business owners".to_string(),
            industry: "retail".to_string(),
            platform: "Instagram".to_string(),
            content_type: "Mixed Content".to_string(),
        }
    }

    fn live_cache() -> (Arc<MemoryStore>, ResultCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = ResultCache::new(Some(store.clone() as Arc<dyn VolatileStore>), 86400);
        (store, cache)
    }

    #[tokio::test]
    async fn test_absent_store_reads_as_miss() {
        let cache = ResultCache::new(None, 86400);
        assert!(cache.get("any-fingerprint").await.is_none());
    }

    #[tokio::test]
    async fn test_put_without_store_is_a_noop() {
        let cache = ResultCache::new(None, 86400);
        let result = fallback::generate(&input());
        // Must not panic or error
        cache.put("fp", &result).await;
    }

    #[tokio::test]
    async fn test_write_through_round_trip() {
        let (store, cache) = live_cache();
        let result = fallback::generate(&input());

        assert!(cache.get("fp").await.is_none());
        cache.put("fp", &result).await;

        let hit = cache.get("fp").await.unwrap();
        assert_eq!(
            serde_json::to_string(&hit).unwrap(),
            serde_json::to_string(&result).unwrap()
        );
        assert_eq!(store.ttl_of(categories::STRATEGY, "fp"), Some(86400));
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_dropped_and_misses() {
        let (store, cache) = live_cache();
        store
            .set_value(categories::STRATEGY, "fp", "not json".to_string(), 86400)
            .await
            .unwrap();

        assert!(cache.get("fp").await.is_none());
        // The bad entry was deleted, not left to fail every read
        assert!(store
            .get_value(categories::STRATEGY, "fp")
            .await
            .unwrap()
            .is_none());
    }
}
