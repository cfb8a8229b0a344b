//! Pollable job status records.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{QueueError, QueueResult};
use crate::job::encode;
use crate::keys::Keys;
use crate::store::Store;

/// Job lifecycle state, stored as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum JobState {
    /// Job is queued and waiting for a worker
    Waiting = 1,
    /// Job is being processed
    Running = 2,
    /// Job failed
    Failed = 3,
    /// Job completed successfully
    Complete = 4,
}

impl JobState {
    /// Whether the job has finished, successfully or not.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Failed | Self::Complete)
    }
}

impl From<JobState> for u8 {
    fn from(state: JobState) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for JobState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Waiting),
            2 => Ok(Self::Running),
            3 => Ok(Self::Failed),
            4 => Ok(Self::Complete),
            other => Err(format!("unknown job status code {}", other)),
        }
    }
}

/// Status record kept under `job:<id>:status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Current state
    #[serde(rename = "status")]
    pub state: JobState,

    /// Unix time of the last update
    pub updated: i64,

    /// Unix time the record was created
    pub started: i64,
}

/// Reads and writes job status records.
#[derive(Clone)]
pub struct StatusTracker {
    store: Arc<dyn Store>,
    keys: Keys,
}

impl StatusTracker {
    /// Create a tracker over a store.
    pub fn new(store: Arc<dyn Store>, keys: Keys) -> Self {
        Self { store, keys }
    }

    /// Start tracking a job as waiting.
    pub async fn create(&self, id: &str) -> QueueResult<JobStatus> {
        let now = Utc::now().timestamp();
        let status = JobStatus {
            state: JobState::Waiting,
            updated: now,
            started: now,
        };

        self.store
            .set(&self.keys.job_status(id), &encode(&status)?)
            .await?;
        debug!(job_id = id, "Job status tracking started");
        Ok(status)
    }

    /// Get the status of a tracked job.
    pub async fn get(&self, id: &str) -> QueueResult<Option<JobStatus>> {
        match self.store.get(&self.keys.job_status(id)).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| QueueError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Move a tracked job to a new state.
    ///
    /// Returns `false` when the job is not tracked.
    pub async fn update(&self, id: &str, state: JobState) -> QueueResult<bool> {
        let Some(mut status) = self.get(id).await? else {
            return Ok(false);
        };

        status.state = state;
        status.updated = Utc::now().timestamp();
        self.store
            .set(&self.keys.job_status(id), &encode(&status)?)
            .await?;
        Ok(true)
    }

    /// Stop tracking a job.
    pub async fn remove(&self, id: &str) -> QueueResult<bool> {
        self.store.delete(&self.keys.job_status(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn tracker() -> StatusTracker {
        StatusTracker::new(Arc::new(MemoryStore::new()), Keys::default())
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(serde_json::to_value(JobState::Waiting).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(JobState::Complete).unwrap(), json!(4));
        assert_eq!(
            serde_json::from_value::<JobState>(json!(3)).unwrap(),
            JobState::Failed
        );
        assert!(serde_json::from_value::<JobState>(json!(9)).is_err());
    }

    #[test]
    fn test_record_wire_format() {
        let raw = r#"{"status":2,"updated":1700000100,"started":1700000000}"#;
        let status: JobStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(status.state, JobState::Running);
        assert_eq!(status.started, 1700000000);
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let tracker = tracker();

        let created = tracker.create("abc").await.unwrap();
        assert_eq!(created.state, JobState::Waiting);

        assert!(tracker.update("abc", JobState::Running).await.unwrap());
        let status = tracker.get("abc").await.unwrap().unwrap();
        assert_eq!(status.state, JobState::Running);
        assert_eq!(status.started, created.started);
        assert!(!status.state.is_finished());

        tracker.update("abc", JobState::Complete).await.unwrap();
        assert!(tracker.get("abc").await.unwrap().unwrap().state.is_finished());

        assert!(tracker.remove("abc").await.unwrap());
        assert!(tracker.get("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_untracked_job() {
        let tracker = tracker();
        assert!(!tracker.update("missing", JobState::Failed).await.unwrap());
    }
}
