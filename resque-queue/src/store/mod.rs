//! Store adapter over the list, sorted-set, set and key commands the queue
//! layer uses.
//!
//! Each call is a single store command and is atomic on its own. Nothing in
//! this trait groups commands into a transaction.

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use async_trait::async_trait;

use crate::error::QueueResult;

/// Store backend trait.
///
/// Implement this trait to back the queue layer with a custom store.
/// Semantics follow the Redis commands named on each method.
#[async_trait]
pub trait Store: Send + Sync {
    /// RPUSH: append to a list, returning its new length.
    async fn list_push(&self, key: &str, value: &str) -> QueueResult<u64>;

    /// LRANGE: inclusive range, negative indexes count from the tail.
    async fn list_range(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<String>>;

    /// LLEN
    async fn list_length(&self, key: &str) -> QueueResult<usize>;

    /// LREM: remove `count` occurrences from the head (negative: from the
    /// tail, zero: all), returning how many were removed.
    async fn list_remove(&self, key: &str, count: isize, value: &str) -> QueueResult<usize>;

    /// DEL
    async fn delete(&self, key: &str) -> QueueResult<bool>;

    /// ZADD
    async fn sorted_set_add(&self, key: &str, score: i64, member: &str) -> QueueResult<()>;

    /// ZRANGE by rank, ascending score.
    async fn sorted_set_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> QueueResult<Vec<String>>;

    /// ZREM
    async fn sorted_set_remove(&self, key: &str, member: &str) -> QueueResult<bool>;

    /// ZCARD
    async fn sorted_set_cardinality(&self, key: &str) -> QueueResult<usize>;

    /// SADD
    async fn set_add(&self, key: &str, member: &str) -> QueueResult<bool>;

    /// SREM
    async fn set_remove(&self, key: &str, member: &str) -> QueueResult<bool>;

    /// SMEMBERS
    async fn set_members(&self, key: &str) -> QueueResult<Vec<String>>;

    /// SISMEMBER
    async fn set_is_member(&self, key: &str, member: &str) -> QueueResult<bool>;

    /// SCARD
    async fn set_cardinality(&self, key: &str) -> QueueResult<usize>;

    /// GET
    async fn get(&self, key: &str) -> QueueResult<Option<String>>;

    /// SET
    async fn set(&self, key: &str, value: &str) -> QueueResult<()>;
}
