//! Failed job registry.
//!
//! Workers append a record to the `failed` list when a job fails for good.
//! This module pages through those records, replays them and purges them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::Resque;
use crate::error::QueueResult;
use crate::job::{decode_entries, JobArgs, QueuedPayload};
use crate::retry::{self, RetryStrategy};

/// A failure record as written by Resque workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedJob {
    /// When the job failed, as formatted by the worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<String>,

    /// The payload that failed
    pub payload: QueuedPayload,

    /// Exception type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,

    /// Error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Stack trace lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtrace: Option<Vec<String>>,

    /// Worker that ran the job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,

    /// Queue the job was taken from
    #[serde(default)]
    pub queue: String,

    /// Fields written by other workers, kept as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl FailedJob {
    /// Create a record for a payload taken from `queue`, stamped now.
    pub fn new(queue: impl Into<String>, payload: QueuedPayload) -> Self {
        Self {
            failed_at: Some(Utc::now().format("%a %b %d %H:%M:%S UTC %Y").to_string()),
            payload,
            exception: None,
            error: None,
            backtrace: None,
            worker: None,
            queue: queue.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Set the exception type and message.
    pub fn with_error(mut self, exception: impl Into<String>, error: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self.error = Some(error.into());
        self
    }

    /// Set the worker that ran the job.
    pub fn with_worker(mut self, worker: impl Into<String>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Job id.
    pub fn id(&self) -> &str {
        &self.payload.id
    }

    /// Job class.
    pub fn class(&self) -> &str {
        &self.payload.class
    }

    /// Queue the job came from.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Arguments the job failed with.
    pub fn args(&self) -> &JobArgs {
        &self.payload.args
    }

    /// Exception type.
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    /// Error message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Worker that ran the job.
    pub fn worker(&self) -> Option<&str> {
        self.worker.as_deref()
    }

    /// Failure time as written by the worker.
    pub fn failed_at(&self) -> Option<&str> {
        self.failed_at.as_deref()
    }

    /// Retry strategy snapshot taken at enqueue time.
    pub fn retry_strategy(&self) -> Option<RetryStrategy> {
        retry::strategy_from_args(&self.payload.args)
    }

    /// Attempt the job failed on.
    pub fn retry_attempt(&self) -> u64 {
        retry::attempt_from_args(&self.payload.args)
    }

    /// Whether a non-empty retry strategy was attached.
    pub fn has_retry_strategy(&self) -> bool {
        self.retry_strategy().is_some_and(|s| !s.is_empty())
    }

    /// Whether the failure happened on the strategy's final attempt.
    pub fn is_last_attempt(&self) -> bool {
        self.retry_strategy()
            .is_some_and(|s| s.is_last_attempt(self.retry_attempt()))
    }

    /// Arguments to replay the job with, attempt counter reset.
    pub fn retry_args(&self) -> JobArgs {
        let mut args = self.payload.args.clone();
        retry::reset_attempt(&mut args);
        args
    }
}

impl Resque {
    /// A page of failure records, oldest first.
    ///
    /// Malformed records are skipped, so a page may hold fewer than `count`.
    pub async fn failed_jobs(&self, offset: usize, count: usize) -> QueueResult<Vec<FailedJob>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        // Past the end of any list Redis can hold.
        let Ok(start) = isize::try_from(offset) else {
            return Ok(Vec::new());
        };
        let span = isize::try_from(count - 1).unwrap_or(isize::MAX);
        let stop = start.saturating_add(span);

        let key = self.keys.failed();
        let raw = self.store.list_range(&key, start, stop).await?;

        let (records, _) = decode_entries(raw, &key);
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    /// Number of failure records.
    pub async fn failed_job_count(&self) -> QueueResult<usize> {
        self.store.list_length(&self.keys.failed()).await
    }

    /// Replay failed jobs, returning how many were re-enqueued.
    ///
    /// A job carrying a retry strategy is replayed only when it failed on
    /// its final attempt; earlier failures were already rescheduled by the
    /// retry mechanism. Replayed jobs restart at attempt 0. With
    /// `clear_first`, the list is emptied before any of that is decided, so
    /// skipped records are dropped too.
    ///
    /// Reading, clearing and pushing are separate store commands; concurrent
    /// callers can replay the same records.
    pub async fn retry_failed_jobs(&self, clear_first: bool) -> QueueResult<usize> {
        let key = self.keys.failed();
        let raw = self.store.list_range(&key, 0, -1).await?;

        if clear_first {
            self.store.delete(&key).await?;
        }

        let (records, skipped) = decode_entries::<FailedJob>(raw, &key);
        let mut retried = 0;

        for (_, record) in records {
            if record.has_retry_strategy() && !record.is_last_attempt() {
                debug!(
                    job_id = record.id(),
                    attempt = record.retry_attempt(),
                    "Skipping failed job still inside its retry strategy"
                );
                continue;
            }

            if self.replay(&record).await? {
                retried += 1;
            }
        }

        info!(retried, skipped, cleared = clear_first, "Failed jobs retried");
        Ok(retried)
    }

    /// Replay one failed job by id. The record stays in the failed list.
    pub async fn retry_failed_job(&self, id: &str) -> QueueResult<bool> {
        match self.find_failed(id).await? {
            Some((_, record)) => self.replay(&record).await,
            None => Ok(false),
        }
    }

    /// Remove the first failure record with this id.
    pub async fn clear_failed_job(&self, id: &str) -> QueueResult<bool> {
        match self.find_failed(id).await? {
            Some((raw, _)) => {
                let removed = self.store.list_remove(&self.keys.failed(), 1, &raw).await?;
                Ok(removed > 0)
            }
            None => Ok(false),
        }
    }

    /// Remove every failure record, returning how many there were.
    pub async fn clear_failed_jobs(&self) -> QueueResult<usize> {
        let key = self.keys.failed();
        let count = self.store.list_length(&key).await?;
        if count > 0 {
            self.store.delete(&key).await?;
            info!(removed = count, "Failed jobs cleared");
        }
        Ok(count)
    }

    async fn find_failed(&self, id: &str) -> QueueResult<Option<(String, FailedJob)>> {
        let key = self.keys.failed();
        let raw = self.store.list_range(&key, 0, -1).await?;
        let (records, _) = decode_entries::<FailedJob>(raw, &key);

        Ok(records.into_iter().find(|(_, record)| record.id() == id))
    }

    async fn replay(&self, record: &FailedJob) -> QueueResult<bool> {
        if !self.config.registry.accepts(record.class()) {
            warn!(
                job_id = record.id(),
                class = record.class(),
                "Not retrying failed job of unregistered class"
            );
            return Ok(false);
        }

        let id = self
            .push(record.queue(), record.class(), record.retry_args(), false)
            .await?;
        debug!(failed_id = record.id(), job_id = %id, "Failed job re-enqueued");
        Ok(true)
    }
}
