//! Enqueueing and live queue views.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::Resque;
use crate::error::QueueResult;
use crate::job::{decode_entries, encode, Job, JobArgs, JobId, QueuedPayload};
use crate::keys::Keys;
use crate::store::Store;

impl Resque {
    /// Enqueue a job.
    ///
    /// The retry strategy resolved for the job's class is attached to its
    /// arguments first. The returned id doubles as the status token when
    /// `track_status` is set.
    pub async fn enqueue(&self, job: &Job, track_status: bool) -> QueueResult<JobId> {
        let job = self.prepare(job)?;
        self.push(&job.queue, &job.class, job.args, track_status)
            .await
    }

    /// Enqueue a job unless an identical one is already waiting.
    ///
    /// A waiting payload is a duplicate when its class is the same and its
    /// arguments hold exactly the same pairs, retry strategy included. On a
    /// duplicate, returns the existing id when `track_status` is set and
    /// `None` otherwise.
    ///
    /// The scan and the push are separate store commands: two concurrent
    /// callers can both miss each other and both enqueue.
    pub async fn enqueue_once(&self, job: &Job, track_status: bool) -> QueueResult<Option<JobId>> {
        let job = self.prepare(job)?;
        let source = self.keys.queue(&job.queue);
        let raw = self.store.list_range(&source, 0, -1).await?;
        let (payloads, _) = decode_entries::<QueuedPayload>(raw, &source);

        if let Some((_, existing)) = payloads.into_iter().find(|(_, p)| p.matches(&job)) {
            debug!(
                class = %job.class,
                queue = %job.queue,
                existing_id = %existing.id,
                "Duplicate job suppressed"
            );
            return Ok(track_status.then_some(existing.id));
        }

        self.push(&job.queue, &job.class, job.args, track_status)
            .await
            .map(Some)
    }

    /// Push a payload as-is, without retry resolution or deduplication.
    pub async fn push(
        &self,
        queue: &str,
        class: &str,
        args: JobArgs,
        track_status: bool,
    ) -> QueueResult<JobId> {
        let payload = QueuedPayload::new(class, args);
        let encoded = encode(&payload)?;

        if track_status {
            self.status_tracker().create(&payload.id).await?;
        }

        self.store.set_add(&self.keys.queues(), queue).await?;
        self.store
            .list_push(&self.keys.queue(queue), &encoded)
            .await?;

        debug!(job_id = %payload.id, class, queue, "Job enqueued");
        Ok(payload.id)
    }

    /// All known queues, sorted by name ignoring case.
    pub async fn queues(&self) -> QueueResult<Vec<Queue>> {
        let mut names = self.store.set_members(&self.keys.queues()).await?;
        names.sort_by_cached_key(|name| name.to_lowercase());

        Ok(names.into_iter().map(|name| self.queue(name)).collect())
    }

    /// View of one queue.
    pub fn queue(&self, name: impl Into<String>) -> Queue {
        Queue {
            name: name.into(),
            store: self.store.clone(),
            keys: self.keys.clone(),
        }
    }

    /// Remove every waiting job from a queue, returning how many there were.
    pub async fn clear_queue(&self, name: &str) -> QueueResult<usize> {
        self.queue(name).clear().await
    }
}

/// Live view of a named queue.
#[derive(Clone)]
pub struct Queue {
    name: String,
    store: Arc<dyn Store>,
    keys: Keys,
}

impl Queue {
    /// Queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of waiting jobs.
    pub async fn size(&self) -> QueueResult<usize> {
        self.store.list_length(&self.keys.queue(&self.name)).await
    }

    /// Waiting jobs in FIFO order. Malformed payloads are skipped.
    pub async fn jobs(&self) -> QueueResult<Vec<QueuedPayload>> {
        let key = self.keys.queue(&self.name);
        let raw = self.store.list_range(&key, 0, -1).await?;
        let (payloads, _) = decode_entries(raw, &key);
        Ok(payloads.into_iter().map(|(_, payload)| payload).collect())
    }

    /// Remove every waiting job, returning how many there were.
    ///
    /// The queue stays registered.
    pub async fn clear(&self) -> QueueResult<usize> {
        let key = self.keys.queue(&self.name);
        let size = self.store.list_length(&key).await?;
        if size > 0 {
            self.store.delete(&key).await?;
            info!(queue = %self.name, removed = size, "Queue cleared");
        }
        Ok(size)
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("key", &self.keys.queue(&self.name))
            .finish()
    }
}
