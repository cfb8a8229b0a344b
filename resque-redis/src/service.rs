//! Redis service with the command helpers the queue layer relies on.

use redis::AsyncCommands;

use crate::{
    RedisConfig, RedisError, Result,
    pool::{RedisConnection, RedisPool, RedisPoolBuilder},
};

/// Redis service providing a connection pool and typed command helpers.
///
/// Every helper checks a connection out of the pool for the duration of a
/// single command. No helper retries on failure.
pub struct RedisService {
    config: RedisConfig,
    pool: RedisPool,
}

impl RedisService {
    /// Create a new Redis service.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let pool = RedisPoolBuilder::new(config.clone()).build().await?;
        Ok(Self { config, pool })
    }

    /// Create from an existing pool.
    pub fn from_pool(config: RedisConfig, pool: RedisPool) -> Self {
        Self { config, pool }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Get a connection from the pool.
    pub async fn get(&self) -> Result<RedisConnection<'_>> {
        let conn = self.pool.get().await?;
        Ok(RedisConnection::new(conn))
    }

    /// Check if the connection is healthy.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| RedisError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Get pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    /// Get a string value.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Set a string value.
    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.get().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.get().await?;
        let deleted: u32 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    /// Append to the tail of a list, returning the new length.
    pub async fn rpush(&self, key: &str, value: &str) -> Result<u64> {
        let mut conn = self.get().await?;
        let len: u64 = conn.rpush(key, value).await?;
        Ok(len)
    }

    /// List range, inclusive on both ends; negative indexes count from the tail.
    pub async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.get().await?;
        let values: Vec<String> = conn.lrange(key, start, stop).await?;
        Ok(values)
    }

    /// List length.
    pub async fn llen(&self, key: &str) -> Result<u64> {
        let mut conn = self.get().await?;
        let len: u64 = conn.llen(key).await?;
        Ok(len)
    }

    /// Remove `count` occurrences of `value` from a list (0 removes all).
    pub async fn lrem(&self, key: &str, count: isize, value: &str) -> Result<u64> {
        let mut conn = self.get().await?;
        let removed: u64 = conn.lrem(key, count, value).await?;
        Ok(removed)
    }

    /// Sorted set add.
    pub async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<()> {
        let mut conn = self.get().await?;
        let _: () = conn.zadd(key, member, score).await?;
        Ok(())
    }

    /// Sorted set range by rank, ascending score.
    pub async fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.get().await?;
        let members: Vec<String> = conn.zrange(key, start, stop).await?;
        Ok(members)
    }

    /// Sorted set remove.
    pub async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.get().await?;
        let removed: u32 = conn.zrem(key, member).await?;
        Ok(removed > 0)
    }

    /// Sorted set cardinality.
    pub async fn zcard(&self, key: &str) -> Result<u64> {
        let mut conn = self.get().await?;
        let count: u64 = conn.zcard(key).await?;
        Ok(count)
    }

    /// Set add.
    pub async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.get().await?;
        let added: u32 = conn.sadd(key, member).await?;
        Ok(added > 0)
    }

    /// Set remove.
    pub async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.get().await?;
        let removed: u32 = conn.srem(key, member).await?;
        Ok(removed > 0)
    }

    /// Set members.
    pub async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.get().await?;
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    /// Set is member.
    pub async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.get().await?;
        let is_member: bool = conn.sismember(key, member).await?;
        Ok(is_member)
    }

    /// Set cardinality.
    pub async fn scard(&self, key: &str) -> Result<u64> {
        let mut conn = self.get().await?;
        let count: u64 = conn.scard(key).await?;
        Ok(count)
    }
}

/// Connection pool statistics.
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Total connections.
    pub connections: u32,
    /// Idle connections.
    pub idle_connections: u32,
}
