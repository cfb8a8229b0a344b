//! Redis key layout with namespace support.

/// Default namespace shared with other Resque implementations.
pub const DEFAULT_PREFIX: &str = "resque:";

/// Builds every key the queue layer reads or writes.
#[derive(Debug, Clone)]
pub struct Keys {
    prefix: String,
}

impl Keys {
    /// Create a key layout under `prefix`. A trailing `:` is added if missing.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with(':') {
            prefix.push(':');
        }
        Self { prefix }
    }

    /// Get the prefix, including its trailing `:`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    /// Set of known queue names.
    pub fn queues(&self) -> String {
        self.key("queues")
    }

    /// List of pending payloads for one queue.
    pub fn queue(&self, name: &str) -> String {
        self.key(&format!("queue:{}", name))
    }

    /// List of failure records.
    pub fn failed(&self) -> String {
        self.key("failed")
    }

    /// Sorted set of timestamps that have delayed jobs.
    pub fn delayed_schedule(&self) -> String {
        self.key("delayed_queue_schedule")
    }

    /// List of delayed payloads due at `timestamp`.
    pub fn delayed(&self, timestamp: i64) -> String {
        self.key(&format!("delayed:{}", timestamp))
    }

    /// Set of registered worker ids.
    pub fn workers(&self) -> String {
        self.key("workers")
    }

    /// Job the worker is currently processing.
    pub fn worker(&self, id: &str) -> String {
        self.key(&format!("worker:{}", id))
    }

    /// When the worker started.
    pub fn worker_started(&self, id: &str) -> String {
        self.key(&format!("worker:{}:started", id))
    }

    /// Last heartbeat of the worker, as unix seconds.
    pub fn worker_heartbeat(&self, id: &str) -> String {
        self.key(&format!("worker:{}:heartbeat", id))
    }

    /// Status record of a tracked job.
    pub fn job_status(&self, id: &str) -> String {
        self.key(&format!("job:{}:status", id))
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
