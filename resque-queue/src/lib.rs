//! Resque-compatible job queue management.
//!
//! Provides the producer and operator side of a Resque deployment:
//! - 📦 Enqueueing onto Redis lists in the Resque payload format
//! - 🔁 Best-effort duplicate suppression with `enqueue_once`
//! - 🔄 Per-class and global retry strategies attached to job arguments
//! - ⏰ Delayed jobs indexed by timestamp
//! - 💀 Failed job inspection, replay and purging
//! - 👷 Queue and worker introspection, dead worker pruning
//! - 📊 Pollable job status tracking
//!
//! Workers and the delayed-job promoter are external processes sharing the
//! same keys.
//!
//! ## Quick Start - Job Creation
//!
//! ```
//! use resque_queue::Job;
//!
//! let job = Job::new("emails", "App\\Job\\SendWelcome")
//!     .with_arg("to", "user@example.com");
//!
//! assert_eq!(job.queue, "emails");
//! assert_eq!(job.class, "App\\Job\\SendWelcome");
//! assert_eq!(job.args["to"], "user@example.com");
//! ```
//!
//! ## Retry Strategies
//!
//! ```
//! use resque_queue::ResqueConfig;
//!
//! let config = ResqueConfig::builder()
//!     .global_retry_strategy(vec![5, 30, 120])
//!     .job_retry_strategy("App\\Job\\Report", Vec::<u64>::new())
//!     .build();
//!
//! assert_eq!(config.retry.resolve("App\\Job\\Mail").unwrap().waits(), &[5, 30, 120]);
//! assert!(config.retry.resolve("App\\Job\\Report").unwrap().is_empty());
//! ```
//!
//! ## In-Memory Store
//!
//! ```
//! use resque_queue::{Job, MemoryStore, Resque, ResqueConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let resque = Resque::new(Arc::new(MemoryStore::new()), ResqueConfig::default());
//! let job = Job::new("emails", "SendWelcome").with_arg("user_id", 7);
//!
//! resque.enqueue_once(&job, false).await.unwrap();
//! resque.enqueue_once(&job, false).await.unwrap();
//!
//! assert_eq!(resque.queue("emails").size().await.unwrap(), 1);
//! # }
//! ```
//!
//! ## Complete Example
//!
//! ```no_run
//! use resque_queue::*;
//! use resque_redis::RedisConfig;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QueueError> {
//!     let resque = Resque::connect(
//!         RedisConfig::from_env().build(),
//!         ResqueConfig::from_env().build(),
//!     )
//!     .await?;
//!
//!     // Enqueue now, with status tracking
//!     let job = Job::new("emails", "SendWelcome").with_arg("user_id", 7);
//!     let id = resque.enqueue(&job, true).await?;
//!     println!("status: {:?}", resque.job_status(&id).await?);
//!
//!     // Enqueue in an hour
//!     resque.enqueue_in(Duration::from_secs(3600), &job).await?;
//!
//!     // Replay jobs that failed on their last attempt
//!     let retried = resque.retry_failed_jobs(false).await?;
//!     println!("retried {} failed jobs", retried);
//!
//!     Ok(())
//! }
//! ```

mod client;

pub mod config;
pub mod error;
pub mod failed;
pub mod job;
pub mod keys;
pub mod queue;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod worker;

pub use client::Resque;
pub use config::{ResqueConfig, ResqueConfigBuilder};
pub use error::{QueueError, QueueResult};
pub use failed::FailedJob;
pub use job::{
    DEFAULT_QUEUE, DelayedPayload, Job, JobArgs, JobId, JobType, QueuedPayload,
    RETRY_ATTEMPT_KEY, RETRY_STRATEGY_KEY,
};
pub use keys::Keys;
pub use queue::Queue;
pub use registry::JobRegistry;
pub use retry::{RetryStrategy, RetryStrategyResolver};
pub use scheduler::ScheduledBucket;
pub use status::{JobState, JobStatus, StatusTracker};
pub use store::{MemoryStore, RedisStore, Store};
pub use worker::{HeartbeatPruner, WorkerDescriptor, WorkerJob, WorkerPruner};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::Resque;
    pub use crate::config::ResqueConfig;
    pub use crate::error::{QueueError, QueueResult};
    pub use crate::job::{Job, JobArgs, JobId, JobType};
    pub use crate::registry::JobRegistry;
    pub use crate::status::{JobState, JobStatus};
    pub use crate::store::{MemoryStore, RedisStore, Store};
}
