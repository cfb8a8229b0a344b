//! The `Resque` handle shared by every queue operation.

use resque_redis::RedisConfig;
use std::sync::Arc;
use tracing::info;

use crate::config::ResqueConfig;
use crate::error::QueueResult;
use crate::job::{DEFAULT_QUEUE, Job};
use crate::keys::Keys;
use crate::status::{JobStatus, StatusTracker};
use crate::store::{RedisStore, Store};
use crate::worker::{HeartbeatPruner, WorkerPruner};

/// Entry point for enqueueing, scheduling, failure recovery and
/// introspection.
///
/// Cloning is cheap; clones share the store and configuration.
#[derive(Clone)]
pub struct Resque {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) keys: Keys,
    pub(crate) config: Arc<ResqueConfig>,
    pub(crate) pruner: Arc<dyn WorkerPruner>,
}

impl Resque {
    /// Create a handle over an existing store.
    pub fn new(store: Arc<dyn Store>, config: ResqueConfig) -> Self {
        let keys = Keys::new(config.prefix.clone());
        let pruner = Arc::new(HeartbeatPruner::new(config.heartbeat_expiry));

        Self {
            store,
            keys,
            config: Arc::new(config),
            pruner,
        }
    }

    /// Connect to Redis and create a handle.
    pub async fn connect(redis: RedisConfig, config: ResqueConfig) -> QueueResult<Self> {
        let store = RedisStore::connect(redis).await?;
        info!(prefix = %config.prefix, "Resque client ready");
        Ok(Self::new(Arc::new(store), config))
    }

    /// Replace the worker liveness check used by
    /// [`prune_dead_workers`](Self::prune_dead_workers).
    pub fn with_pruner(mut self, pruner: impl WorkerPruner + 'static) -> Self {
        self.pruner = Arc::new(pruner);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ResqueConfig {
        &self.config
    }

    /// Get the key layout.
    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    /// Get the store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Start a job for `class` on its registered queue, or the default queue.
    pub fn new_job(&self, class: impl Into<String>) -> Job {
        let class = class.into();
        let queue = self
            .config
            .registry
            .default_queue(&class)
            .unwrap_or(DEFAULT_QUEUE)
            .to_string();
        Job::new(queue, class)
    }

    /// Check the job against the registry and attach its retry strategy.
    pub(crate) fn prepare(&self, job: &Job) -> QueueResult<Job> {
        self.config.registry.check(&job.class)?;

        let mut job = job.clone();
        self.config.retry.attach(&mut job);
        Ok(job)
    }

    /// Status tracker sharing this handle's store.
    pub fn status_tracker(&self) -> StatusTracker {
        StatusTracker::new(self.store.clone(), self.keys.clone())
    }

    /// Poll the status of a job enqueued with tracking.
    pub async fn job_status(&self, id: &str) -> QueueResult<Option<JobStatus>> {
        self.status_tracker().get(id).await
    }
}
