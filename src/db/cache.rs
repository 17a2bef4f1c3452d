// db/cache.rs
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::referralmodel::ReferralCode;

pub const REFERRAL_CODE_CACHE_PREFIX: &str = "referral_code_";

pub fn referral_code_key(code: Uuid) -> String {
    format!("{}{}", REFERRAL_CODE_CACHE_PREFIX, code)
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Lookup mirror of referral codes, keyed by code value.
///
/// Entries never expire on their own; whoever mutates a code keeps its entry
/// in step with the store.
#[async_trait]
pub trait ReferralCodeCache: Send + Sync {
    async fn set(&self, referral_code: &ReferralCode) -> Result<(), CacheError>;

    async fn get(&self, code: Uuid) -> Result<Option<ReferralCode>, CacheError>;

    async fn delete(&self, code: Uuid) -> Result<(), CacheError>;

    fn backend(&self) -> &'static str;
}

pub struct CacheHelper;

impl CacheHelper {
    /// Generic get from cache
    pub async fn get<T: DeserializeOwned>(
        redis: &Arc<ConnectionManager>,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        let mut conn = ConnectionManager::clone(redis);
        let cached: Option<String> = conn.get(key).await?;

        match cached {
            Some(data) => {
                let value = serde_json::from_str::<T>(&data)?;
                tracing::debug!("Cache HIT: {}", key);
                Ok(Some(value))
            }
            None => {
                tracing::debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    /// Set without a TTL; the entry lives until deleted.
    pub async fn set_persistent<T: Serialize>(
        redis: &Arc<ConnectionManager>,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        let mut conn = ConnectionManager::clone(redis);
        let _: () = conn.set(key, json).await?;
        tracing::debug!("Cache SET: {} (no TTL)", key);
        Ok(())
    }

    /// Delete a cache key
    pub async fn delete(redis: &Arc<ConnectionManager>, key: &str) -> Result<(), CacheError> {
        let mut conn = ConnectionManager::clone(redis);
        let _: () = conn.del(key).await?;
        tracing::debug!("Cache DELETE: {}", key);
        Ok(())
    }

    /// Check Redis health
    pub async fn health_check(redis: &Arc<ConnectionManager>) -> Result<bool, CacheError> {
        let mut conn = ConnectionManager::clone(redis);
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response == "PONG")
    }
}

pub struct RedisReferralCodeCache {
    redis: Arc<ConnectionManager>,
}

impl RedisReferralCodeCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        let redis = Arc::new(conn);

        if CacheHelper::health_check(&redis).await? {
            tracing::info!("✅ Redis connection established successfully");
        }

        Ok(RedisReferralCodeCache { redis })
    }
}

#[async_trait]
impl ReferralCodeCache for RedisReferralCodeCache {
    async fn set(&self, referral_code: &ReferralCode) -> Result<(), CacheError> {
        CacheHelper::set_persistent(&self.redis, &referral_code_key(referral_code.code), referral_code)
            .await
    }

    async fn get(&self, code: Uuid) -> Result<Option<ReferralCode>, CacheError> {
        CacheHelper::get(&self.redis, &referral_code_key(code)).await
    }

    async fn delete(&self, code: Uuid) -> Result<(), CacheError> {
        CacheHelper::delete(&self.redis, &referral_code_key(code)).await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Process-local cache used when Redis is not configured.
#[derive(Debug, Default)]
pub struct MemoryReferralCodeCache {
    entries: RwLock<HashMap<String, ReferralCode>>,
}

impl MemoryReferralCodeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferralCodeCache for MemoryReferralCodeCache {
    async fn set(&self, referral_code: &ReferralCode) -> Result<(), CacheError> {
        let key = referral_code_key(referral_code.code);
        tracing::debug!("Cache SET: {} (no TTL)", key);
        self.entries.write().await.insert(key, referral_code.clone());
        Ok(())
    }

    async fn get(&self, code: Uuid) -> Result<Option<ReferralCode>, CacheError> {
        let key = referral_code_key(code);
        let cached = self.entries.read().await.get(&key).cloned();
        if cached.is_some() {
            tracing::debug!("Cache HIT: {}", key);
        } else {
            tracing::debug!("Cache MISS: {}", key);
        }
        Ok(cached)
    }

    async fn delete(&self, code: Uuid) -> Result<(), CacheError> {
        let key = referral_code_key(code);
        self.entries.write().await.remove(&key);
        tracing::debug!("Cache DELETE: {}", key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
