// Resque - Resque-compatible job queue management for Rust
//
// This library manages the producer and operator side of a Resque deployment:
// enqueueing with deduplication, retry strategies, delayed jobs, failed job
// recovery and queue/worker introspection over Redis.

// Re-export the queue layer
pub use resque_queue::*;

// Re-export the Redis layer
pub use resque_redis;
pub use resque_redis::{RedisConfig, RedisConfigBuilder, RedisError, RedisService};

/// Prelude for common imports.
///
/// ```
/// use resque::prelude::*;
///
/// let job = Job::new("emails", "SendWelcome").with_arg("user_id", 7);
/// let config = ResqueConfig::builder().global_retry_strategy(vec![5, 30]).build();
///
/// assert!(config.retry.resolve(&job.class).is_some());
/// ```
pub mod prelude {
    pub use resque_queue::prelude::*;
    pub use resque_redis::{RedisConfig, RedisError};
}
