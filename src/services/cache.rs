use crate::models::{ComposedQuery, Listing};
use redis::aio::ConnectionManager;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Two-tier cache for query embeddings and stored listings
///
/// L1 is an in-process moka cache, L2 is Redis shared across instances.
/// Composed query text is deterministic, so identical preferences reuse
/// the same embedding instead of calling the provider again.
///
/// The typed helpers (`query_embedding`, `listing`, ...) never fail: a
/// broken cache only costs a provider or database round trip, so errors are
/// logged and reported as a miss.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, Arc<str>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Connect to Redis and size the in-process tier
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Cached embedding of a composed query
    pub async fn query_embedding(&self, query: &ComposedQuery) -> Option<Vec<f32>> {
        self.lookup(&CacheKey::query_embedding(query)).await
    }

    pub async fn store_query_embedding(&self, query: &ComposedQuery, embedding: &[f32]) {
        self.store(&CacheKey::query_embedding(query), embedding).await;
    }

    /// Cached copy of a stored listing
    pub async fn listing(&self, listing_id: &str) -> Option<Listing> {
        self.lookup(&CacheKey::listing(listing_id)).await
    }

    pub async fn store_listing(&self, listing: &Listing) {
        self.store(&CacheKey::listing(&listing.id), listing).await;
    }

    /// Drop a listing after it was re-ingested
    pub async fn evict_listing(&self, listing_id: &str) {
        let key = CacheKey::listing(listing_id);
        if let Err(e) = self.delete(&key).await {
            tracing::warn!("Failed to evict {}: {}", key, e);
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key).await {
            Ok(value) => Some(value),
            Err(CacheError::CacheMiss(_)) => None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.set(key, value).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
    }

    /// Read a value, L1 first, then Redis (refilling L1 on a hit)
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        if let Some(json) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_str(&json)?);
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
        drop(conn);

        let Some(json) = value else {
            tracing::trace!("Cache miss: {}", key);
            return Err(CacheError::CacheMiss(key.to_string()));
        };

        tracing::trace!("L2 cache hit: {}", key);
        let parsed = serde_json::from_str(&json)?;
        self.l1_cache.insert(key.to_string(), Arc::from(json)).await;
        Ok(parsed)
    }

    /// Write a value to both tiers with the configured TTL
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;

        {
            let mut conn = self.redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(&json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        self.l1_cache.insert(key.to_string(), Arc::from(json)).await;
        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Remove a key from both tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;
        let mut conn = self.redis.lock().await;
        redis::cmd("DEL").arg(key).query_async::<()>(&mut *conn).await?;
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for the embedding of a composed query
    pub fn query_embedding(query: &ComposedQuery) -> String {
        format!("embedding:{}", query.cache_key())
    }

    /// Key for a stored listing
    pub fn listing(listing_id: &str) -> String {
        format!("listing:{}", listing_id)
    }
}
