//! Redis-backed store.

use async_trait::async_trait;
use resque_redis::{RedisConfig, RedisService};
use std::sync::Arc;
use tracing::info;

use super::Store;
use crate::error::QueueResult;

/// Store backed by a pooled Redis connection.
#[derive(Clone)]
pub struct RedisStore {
    redis: Arc<RedisService>,
}

impl RedisStore {
    /// Connect using the given Redis configuration.
    pub async fn connect(config: RedisConfig) -> QueueResult<Self> {
        info!(url = %config.url, "Connecting queue store to Redis");
        let redis = RedisService::new(config).await?;
        Ok(Self::new(Arc::new(redis)))
    }

    /// Wrap an existing Redis service.
    pub fn new(redis: Arc<RedisService>) -> Self {
        Self { redis }
    }

    /// The underlying Redis service.
    pub fn service(&self) -> &RedisService {
        &self.redis
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn list_push(&self, key: &str, value: &str) -> QueueResult<u64> {
        Ok(self.redis.rpush(key, value).await?)
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<String>> {
        Ok(self.redis.lrange(key, start, stop).await?)
    }

    async fn list_length(&self, key: &str) -> QueueResult<usize> {
        Ok(self.redis.llen(key).await? as usize)
    }

    async fn list_remove(&self, key: &str, count: isize, value: &str) -> QueueResult<usize> {
        Ok(self.redis.lrem(key, count, value).await? as usize)
    }

    async fn delete(&self, key: &str) -> QueueResult<bool> {
        Ok(self.redis.delete(key).await?)
    }

    async fn sorted_set_add(&self, key: &str, score: i64, member: &str) -> QueueResult<()> {
        Ok(self.redis.zadd(key, score, member).await?)
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> QueueResult<Vec<String>> {
        Ok(self.redis.zrange(key, start, stop).await?)
    }

    async fn sorted_set_remove(&self, key: &str, member: &str) -> QueueResult<bool> {
        Ok(self.redis.zrem(key, member).await?)
    }

    async fn sorted_set_cardinality(&self, key: &str) -> QueueResult<usize> {
        Ok(self.redis.zcard(key).await? as usize)
    }

    async fn set_add(&self, key: &str, member: &str) -> QueueResult<bool> {
        Ok(self.redis.sadd(key, member).await?)
    }

    async fn set_remove(&self, key: &str, member: &str) -> QueueResult<bool> {
        Ok(self.redis.srem(key, member).await?)
    }

    async fn set_members(&self, key: &str) -> QueueResult<Vec<String>> {
        Ok(self.redis.smembers(key).await?)
    }

    async fn set_is_member(&self, key: &str, member: &str) -> QueueResult<bool> {
        Ok(self.redis.sismember(key, member).await?)
    }

    async fn set_cardinality(&self, key: &str) -> QueueResult<usize> {
        Ok(self.redis.scard(key).await? as usize)
    }

    async fn get(&self, key: &str) -> QueueResult<Option<String>> {
        Ok(self.redis.get_value(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> QueueResult<()> {
        Ok(self.redis.set_value(key, value).await?)
    }
}
