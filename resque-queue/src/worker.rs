//! Worker introspection and dead worker pruning.
//!
//! Workers are external processes that register themselves in the `workers`
//! set and write their current job under `worker:<id>`. Nothing here
//! registers or runs a worker.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::Resque;
use crate::error::QueueResult;
use crate::job::QueuedPayload;
use crate::keys::Keys;
use crate::store::Store;

/// The job a worker is processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerJob {
    /// Queue the payload was taken from
    pub queue: String,

    /// When processing started, as formatted by the worker
    #[serde(default)]
    pub run_at: Option<String>,

    /// The payload being processed
    pub payload: QueuedPayload,
}

/// Read-only view of a registered worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerDescriptor {
    /// Worker id, `<hostname>:<pid>:<queue,queue>`
    pub id: String,

    /// Host the worker runs on
    pub hostname: String,

    /// Process id
    pub pid: Option<u32>,

    /// Queues the worker polls
    pub queues: Vec<String>,

    /// Job being processed, if any
    pub current_job: Option<WorkerJob>,

    /// When the worker started, as written by the worker
    pub started: Option<String>,
}

impl WorkerDescriptor {
    /// Build a descriptor from a worker id, with no job and no start time.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut parts = id.splitn(3, ':');
        let hostname = parts.next().unwrap_or_default().to_string();
        let pid = parts.next().and_then(|pid| pid.parse().ok());
        let queues = parts
            .next()
            .map(|queues| {
                queues
                    .split(',')
                    .filter(|queue| !queue.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id,
            hostname,
            pid,
            queues,
            current_job: None,
            started: None,
        }
    }

    /// Whether the worker is processing a job.
    pub fn is_working(&self) -> bool {
        self.current_job.is_some()
    }
}

/// Decides which registered workers are dead and unregisters them.
#[async_trait]
pub trait WorkerPruner: Send + Sync {
    /// Prune dead workers, returning their ids.
    async fn prune(&self, store: &dyn Store, keys: &Keys) -> QueueResult<Vec<String>>;
}

/// Prunes workers whose heartbeat is missing or older than the expiry.
#[derive(Debug, Clone)]
pub struct HeartbeatPruner {
    expiry: Duration,
}

impl HeartbeatPruner {
    /// Create a pruner with the given heartbeat expiry.
    pub fn new(expiry: Duration) -> Self {
        Self { expiry }
    }

    /// Heartbeat expiry.
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    async fn is_dead(
        &self,
        store: &dyn Store,
        keys: &Keys,
        id: &str,
        now: i64,
    ) -> QueueResult<bool> {
        let beat = store
            .get(&keys.worker_heartbeat(id))
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok());

        let expiry = i64::try_from(self.expiry.as_secs()).unwrap_or(i64::MAX);
        Ok(match beat {
            Some(beat) => now.saturating_sub(beat) > expiry,
            None => true,
        })
    }
}

#[async_trait]
impl WorkerPruner for HeartbeatPruner {
    async fn prune(&self, store: &dyn Store, keys: &Keys) -> QueueResult<Vec<String>> {
        let now = Utc::now().timestamp();
        let mut pruned = Vec::new();

        for id in store.set_members(&keys.workers()).await? {
            if !self.is_dead(store, keys, &id, now).await? {
                continue;
            }

            store.set_remove(&keys.workers(), &id).await?;
            store.delete(&keys.worker(&id)).await?;
            store.delete(&keys.worker_started(&id)).await?;
            store.delete(&keys.worker_heartbeat(&id)).await?;

            debug!(worker = %id, "Pruned dead worker");
            pruned.push(id);
        }

        Ok(pruned)
    }
}

impl Resque {
    /// Every registered worker.
    pub async fn workers(&self) -> QueueResult<Vec<WorkerDescriptor>> {
        let mut ids = self.store.set_members(&self.keys.workers()).await?;
        ids.sort();

        let mut workers = Vec::with_capacity(ids.len());
        for id in ids {
            workers.push(self.load_worker(id).await?);
        }
        Ok(workers)
    }

    /// Registered workers currently processing a job.
    pub async fn running_workers(&self) -> QueueResult<Vec<WorkerDescriptor>> {
        let mut workers = self.workers().await?;
        workers.retain(WorkerDescriptor::is_working);
        Ok(workers)
    }

    /// Look up one worker.
    pub async fn worker(&self, id: &str) -> QueueResult<Option<WorkerDescriptor>> {
        if !self.store.set_is_member(&self.keys.workers(), id).await? {
            return Ok(None);
        }
        self.load_worker(id.to_string()).await.map(Some)
    }

    /// Number of registered workers.
    pub async fn worker_count(&self) -> QueueResult<usize> {
        self.store.set_cardinality(&self.keys.workers()).await
    }

    /// Number of workers processing a job.
    pub async fn working_worker_count(&self) -> QueueResult<usize> {
        Ok(self.running_workers().await?.len())
    }

    /// Unregister workers the configured pruner considers dead.
    pub async fn prune_dead_workers(&self) -> QueueResult<Vec<String>> {
        let pruned = self.pruner.prune(self.store.as_ref(), &self.keys).await?;
        debug!(pruned = pruned.len(), "Dead worker check finished");
        Ok(pruned)
    }

    async fn load_worker(&self, id: String) -> QueueResult<WorkerDescriptor> {
        let current = self.store.get(&self.keys.worker(&id)).await?;
        let started = self.store.get(&self.keys.worker_started(&id)).await?;

        let current_job = current.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(worker = %id, error = %e, "Ignoring malformed current job");
                None
            }
        });

        Ok(WorkerDescriptor {
            current_job,
            started,
            ..WorkerDescriptor::from_id(id)
        })
    }
}
