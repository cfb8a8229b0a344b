//! Delayed job schedule.
//!
//! Jobs due in the future live in one list per unix timestamp, indexed by a
//! sorted set of those timestamps. Moving due jobs onto live queues is left
//! to an external scheduler process reading the same keys.

use chrono::Utc;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::Resque;
use crate::error::QueueResult;
use crate::job::{decode_entries, encode, DelayedPayload, Job};

/// One timestamp of the delayed schedule and how many jobs are due then.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledBucket {
    /// Unix timestamp in seconds
    pub timestamp: i64,

    /// Number of jobs in the bucket
    pub size: usize,
}

impl Resque {
    /// Schedule a job for a unix timestamp.
    pub async fn enqueue_at(&self, timestamp: i64, job: &Job) -> QueueResult<()> {
        let job = self.prepare(job)?;
        let encoded = encode(&DelayedPayload::from(&job))?;

        self.store
            .list_push(&self.keys.delayed(timestamp), &encoded)
            .await?;
        self.store
            .sorted_set_add(
                &self.keys.delayed_schedule(),
                timestamp,
                &timestamp.to_string(),
            )
            .await?;

        debug!(class = %job.class, queue = %job.queue, timestamp, "Job scheduled");
        Ok(())
    }

    /// Schedule a job to run after `delay`, returning the timestamp used.
    pub async fn enqueue_in(&self, delay: Duration, job: &Job) -> QueueResult<i64> {
        let delay = i64::try_from(delay.as_secs()).unwrap_or(i64::MAX);
        let timestamp = Utc::now().timestamp().saturating_add(delay);
        self.enqueue_at(timestamp, job).await?;
        Ok(timestamp)
    }

    /// Remove every scheduled copy of a job, returning how many were removed.
    ///
    /// Entries match when class, queue and arguments are equal. Every
    /// timestamp is scanned.
    pub async fn remove_delayed(&self, job: &Job) -> QueueResult<usize> {
        let job = self.prepare(job)?;
        let mut removed = 0;

        for timestamp in self.schedule_index().await? {
            removed += self.remove_matching(timestamp, &job).await?;
        }

        Ok(removed)
    }

    /// Remove scheduled copies of a job from one timestamp.
    pub async fn remove_from_timestamp(&self, timestamp: i64, job: &Job) -> QueueResult<usize> {
        let job = self.prepare(job)?;
        self.remove_matching(timestamp, &job).await
    }

    /// Every scheduled timestamp with its bucket size, earliest first.
    pub async fn delayed_timestamps(&self) -> QueueResult<Vec<ScheduledBucket>> {
        let mut buckets = Vec::new();
        for timestamp in self.schedule_index().await? {
            buckets.push(self.bucket(timestamp).await?);
        }
        Ok(buckets)
    }

    /// The earliest scheduled timestamp, or `None` when nothing is scheduled.
    pub async fn first_delayed_timestamp(&self) -> QueueResult<Option<ScheduledBucket>> {
        let first = self
            .store
            .sorted_set_range(&self.keys.delayed_schedule(), 0, 0)
            .await?;

        match first.first().and_then(|member| parse_timestamp(member)) {
            Some(timestamp) => Ok(Some(self.bucket(timestamp).await?)),
            None => Ok(None),
        }
    }

    /// Total number of scheduled jobs.
    pub async fn delayed_job_count(&self) -> QueueResult<usize> {
        let mut total = 0;
        for timestamp in self.schedule_index().await? {
            total += self.store.list_length(&self.keys.delayed(timestamp)).await?;
        }
        Ok(total)
    }

    /// Jobs scheduled for a timestamp, left in place.
    pub async fn jobs_at(&self, timestamp: i64) -> QueueResult<Vec<DelayedPayload>> {
        let key = self.keys.delayed(timestamp);
        let raw = self.store.list_range(&key, 0, -1).await?;
        let (entries, _) = decode_entries(raw, &key);
        Ok(entries.into_iter().map(|(_, payload)| payload).collect())
    }

    async fn schedule_index(&self) -> QueueResult<Vec<i64>> {
        let members = self
            .store
            .sorted_set_range(&self.keys.delayed_schedule(), 0, -1)
            .await?;

        Ok(members.iter().filter_map(|m| parse_timestamp(m)).collect())
    }

    async fn bucket(&self, timestamp: i64) -> QueueResult<ScheduledBucket> {
        let size = self.store.list_length(&self.keys.delayed(timestamp)).await?;
        Ok(ScheduledBucket { timestamp, size })
    }

    async fn remove_matching(&self, timestamp: i64, job: &Job) -> QueueResult<usize> {
        let key = self.keys.delayed(timestamp);
        let raw = self.store.list_range(&key, 0, -1).await?;
        let (entries, _) = decode_entries::<DelayedPayload>(raw, &key);

        // Identical raw entries are removed together by a single LREM.
        let matching: BTreeSet<String> = entries
            .into_iter()
            .filter(|(_, payload)| payload.matches(job))
            .map(|(raw, _)| raw)
            .collect();

        let mut removed = 0;
        for entry in &matching {
            removed += self.store.list_remove(&key, 0, entry).await?;
        }

        if removed > 0 {
            debug!(timestamp, removed, class = %job.class, "Delayed jobs removed");
            self.clean_up_bucket(timestamp).await?;
        }

        Ok(removed)
    }

    async fn clean_up_bucket(&self, timestamp: i64) -> QueueResult<()> {
        let key = self.keys.delayed(timestamp);
        if self.store.list_length(&key).await? == 0 {
            self.store.delete(&key).await?;
            self.store
                .sorted_set_remove(&self.keys.delayed_schedule(), &timestamp.to_string())
                .await?;
        }
        Ok(())
    }
}

fn parse_timestamp(member: &str) -> Option<i64> {
    match member.parse() {
        Ok(timestamp) => Some(timestamp),
        Err(_) => {
            warn!(member, "Ignoring non-numeric delayed schedule entry");
            None
        }
    }
}
