//! # Resque Redis
//!
//! Redis connection configuration and pooling for the Resque job-queue layer.
//!
//! ## Features
//!
//! - **Connection Pooling**: Pooled multiplexed connections with bb8
//! - **Environment Configuration**: `REDIS_URL`, `REDIS_DATABASE` and friends
//! - **Command Helpers**: The list, sorted-set, set and key commands the queue
//!   layer is built on
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use resque_redis::{RedisConfig, RedisService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::builder()
//!         .url("redis://localhost:6379")
//!         .pool_size(10)
//!         .build();
//!
//!     let redis = RedisService::new(config).await?;
//!     redis.rpush("resque:queue:default", "{}").await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Host-style Configuration
//!
//! ```
//! use resque_redis::RedisConfig;
//!
//! let config = RedisConfig::from_host("localhost", 6379, 2);
//! assert_eq!(config.connection_url().unwrap(), "redis://localhost:6379/2");
//! ```

mod config;
mod error;
mod pool;
mod service;

pub use config::{RedisConfig, RedisConfigBuilder};
pub use error::{RedisError, Result};
pub use pool::{RedisConnection, RedisPool, RedisPoolBuilder};
pub use service::{PoolStats, RedisService};

// Re-export redis crate for convenience
pub use redis;

/// Prelude for common imports.
///
/// ```
/// use resque_redis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{RedisConfig, RedisConfigBuilder};
    pub use crate::error::{RedisError, Result};
    pub use crate::service::RedisService;
}
