/// Redis-backed volatile store for Stratify
///
/// Holds the two ephemeral data sets of the generation pipeline:
/// - strategy results keyed by cache fingerprint
/// - per-user usage counters with rolling expiry
///
/// The store is strictly optional. Connection failure at startup degrades the
/// service to recompute-everything / fail-open mode rather than crashing.

use crate::config::CacheConfig;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, error, info, warn};

/// The operations the pipeline needs from a volatile store: string values
/// and counters, both with absolute expiry. `CacheClient` is the Redis
/// implementation; tests substitute an in-memory double.
#[async_trait]
pub trait VolatileStore: Send + Sync {
    async fn get_value(&self, category: &str, key: &str) -> ApiResult<Option<String>>;

    async fn set_value(
        &self,
        category: &str,
        key: &str,
        value: String,
        ttl_secs: u64,
    ) -> ApiResult<()>;

    /// Counter read; absent keys read as zero
    async fn get_counter(&self, category: &str, key: &str) -> ApiResult<u64>;

    /// Counter write with a fresh expiry
    async fn set_counter(
        &self,
        category: &str,
        key: &str,
        value: u64,
        ttl_secs: u64,
    ) -> ApiResult<()>;

    async fn delete(&self, category: &str, key: &str) -> ApiResult<()>;
}

/// Redis cache client
#[derive(Clone)]
pub struct CacheClient {
    connection: ConnectionManager,
    key_prefix: String,
}

impl CacheClient {
    /// Connect to Redis
    pub async fn connect(config: &CacheConfig) -> ApiResult<Self> {
        info!("Connecting to Redis at {}", config.redis_url);

        let client = Client::open(config.redis_url.as_str()).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            ApiError::CacheStore(format!("Redis client creation failed: {}", e))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to connect to Redis: {}", e);
            ApiError::CacheStore(format!("Redis connection failed: {}", e))
        })?;

        info!("Redis connection established");

        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Build a cache key with prefix
    fn build_key(&self, category: &str, key: &str) -> String {
        format!("{}{}{}", self.key_prefix, category, key)
    }
}

#[async_trait]
impl VolatileStore for CacheClient {
    async fn get_value(&self, category: &str, key: &str) -> ApiResult<Option<String>> {
        let cache_key = self.build_key(category, key);

        let mut conn = self.connection.clone();
        let result: Option<String> = conn.get(&cache_key).await.map_err(|e| {
            warn!("Redis GET failed for {}: {}", cache_key, e);
            ApiError::CacheStore(format!("Cache get failed: {}", e))
        })?;

        match result {
            Some(value) => {
                debug!("Cache HIT: {}", cache_key);
                Ok(Some(value))
            }
            None => {
                debug!("Cache MISS: {}", cache_key);
                Ok(None)
            }
        }
    }

    async fn set_value(
        &self,
        category: &str,
        key: &str,
        value: String,
        ttl_secs: u64,
    ) -> ApiResult<()> {
        let cache_key = self.build_key(category, key);

        debug!("Cache SET: {} (TTL: {}s)", cache_key, ttl_secs);

        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(&cache_key, value, ttl_secs).await.map_err(|e| {
            warn!("Redis SET failed for {}: {}", cache_key, e);
            ApiError::CacheStore(format!("Cache set failed: {}", e))
        })?;

        Ok(())
    }

    async fn get_counter(&self, category: &str, key: &str) -> ApiResult<u64> {
        let cache_key = self.build_key(category, key);

        let mut conn = self.connection.clone();
        let value: Option<u64> = conn.get(&cache_key).await.map_err(|e| {
            warn!("Redis GET failed for {}: {}", cache_key, e);
            ApiError::CacheStore(format!("Counter read failed: {}", e))
        })?;

        Ok(value.unwrap_or(0))
    }

    async fn set_counter(
        &self,
        category: &str,
        key: &str,
        value: u64,
        ttl_secs: u64,
    ) -> ApiResult<()> {
        let cache_key = self.build_key(category, key);

        debug!("Counter SET: {} = {} (TTL: {}s)", cache_key, value, ttl_secs);

        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(&cache_key, value, ttl_secs).await.map_err(|e| {
            warn!("Redis SET failed for {}: {}", cache_key, e);
            ApiError::CacheStore(format!("Counter write failed: {}", e))
        })?;

        Ok(())
    }

    async fn delete(&self, category: &str, key: &str) -> ApiResult<()> {
        let cache_key = self.build_key(category, key);

        debug!("Cache DELETE: {}", cache_key);

        let mut conn = self.connection.clone();
        let _: () = conn.del(&cache_key).await.map_err(|e| {
            warn!("Redis DELETE failed for {}: {}", cache_key, e);
            ApiError::CacheStore(format!("Cache delete failed: {}", e))
        })?;

        Ok(())
    }
}

/// Cache category constants
pub mod categories {
    pub const STRATEGY: &str = "strategy:";
    pub const USAGE: &str = "usage:";
}

/// In-memory `VolatileStore` used by pipeline tests. Records the TTL of the
/// last write per key so tests can assert window re-arming.
#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
        counters: Mutex<HashMap<String, u64>>,
        ttls: Mutex<HashMap<String, u64>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn full_key(category: &str, key: &str) -> String {
            format!("{}{}", category, key)
        }

        /// TTL of the most recent write for a key
        pub fn ttl_of(&self, category: &str, key: &str) -> Option<u64> {
            self.ttls
                .lock()
                .unwrap()
                .get(&Self::full_key(category, key))
                .copied()
        }
    }

    #[async_trait]
    impl VolatileStore for MemoryStore {
        async fn get_value(&self, category: &str, key: &str) -> ApiResult<Option<String>> {
            Ok(self
                .values
                .lock()
                .unwrap()
                .get(&Self::full_key(category, key))
                .cloned())
        }

        async fn set_value(
            &self,
            category: &str,
            key: &str,
            value: String,
            ttl_secs: u64,
        ) -> ApiResult<()> {
            let full = Self::full_key(category, key);
            self.values.lock().unwrap().insert(full.clone(), value);
            self.ttls.lock().unwrap().insert(full, ttl_secs);
            Ok(())
        }

        async fn get_counter(&self, category: &str, key: &str) -> ApiResult<u64> {
            Ok(self
                .counters
                .lock()
                .unwrap()
                .get(&Self::full_key(category, key))
                .copied()
                .unwrap_or(0))
        }

        async fn set_counter(
            &self,
            category: &str,
            key: &str,
            value: u64,
            ttl_secs: u64,
        ) -> ApiResult<()> {
            let full = Self::full_key(category, key);
            self.counters.lock().unwrap().insert(full.clone(), value);
            self.ttls.lock().unwrap().insert(full, ttl_secs);
            Ok(())
        }

        async fn delete(&self, category: &str, key: &str) -> ApiResult<()> {
            let full = Self::full_key(category, key);
            self.values.lock().unwrap().remove(&full);
            self.counters.lock().unwrap().remove(&full);
            self.ttls.lock().unwrap().remove(&full);
            Ok(())
        }
    }
}
