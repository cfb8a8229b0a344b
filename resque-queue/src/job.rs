//! Job definition and the payload formats stored in Redis.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{QueueError, QueueResult};
use crate::retry::{self, RetryStrategy};

/// Job unique identifier, also used as the status token.
pub type JobId = String;

/// Named job arguments, in insertion order.
pub type JobArgs = serde_json::Map<String, Value>;

/// Argument key holding the retry strategy snapshot.
pub const RETRY_STRATEGY_KEY: &str = "resque.retry_strategy";

/// Argument key holding the zero-based retry attempt.
pub const RETRY_ATTEMPT_KEY: &str = "resque.retry_attempt";

/// Queue used when a job does not name one.
pub const DEFAULT_QUEUE: &str = "default";

/// Generate a new job id (32 lowercase hex characters).
pub fn generate_id() -> JobId {
    Uuid::new_v4().simple().to_string()
}

/// A strongly typed job.
///
/// The implementing type serializes to the job's argument map.
///
/// ```
/// use resque_queue::{Job, JobType};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct SendWelcome {
///     user_id: u64,
/// }
///
/// impl JobType for SendWelcome {
///     const CLASS: &'static str = "App\\Job\\SendWelcome";
///     const QUEUE: &'static str = "emails";
/// }
///
/// let job = Job::typed(&SendWelcome { user_id: 7 }).unwrap();
/// assert_eq!(job.queue, "emails");
/// assert_eq!(job.args["user_id"], 7);
/// ```
pub trait JobType: Serialize {
    /// Stable class identifier written into payloads.
    const CLASS: &'static str;

    /// Queue the job is pushed to.
    const QUEUE: &'static str = DEFAULT_QUEUE;
}

/// A job waiting to be enqueued.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Class identifier
    pub class: String,

    /// Target queue name
    pub queue: String,

    /// Named arguments
    pub args: JobArgs,
}

impl Job {
    /// Create a job with no arguments.
    pub fn new(queue: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            queue: queue.into(),
            args: JobArgs::new(),
        }
    }

    /// Build a job from a typed definition.
    pub fn typed<T: JobType>(job: &T) -> QueueResult<Self> {
        let value =
            serde_json::to_value(job).map_err(|e| QueueError::Serialization(e.to_string()))?;

        let args = match value {
            Value::Object(args) => args,
            Value::Null => JobArgs::new(),
            other => {
                return Err(QueueError::InvalidArguments(format!(
                    "{} must serialize to an object, got {}",
                    T::CLASS,
                    other
                )));
            }
        };

        Ok(Self {
            class: T::CLASS.to_string(),
            queue: T::QUEUE.to_string(),
            args,
        })
    }

    /// Replace all arguments.
    pub fn with_args(mut self, args: JobArgs) -> Self {
        self.args = args;
        self
    }

    /// Add a single argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Move the job to another queue.
    pub fn on_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Retry strategy attached to the arguments, if any.
    pub fn retry_strategy(&self) -> Option<RetryStrategy> {
        retry::strategy_from_args(&self.args)
    }

    /// Retry attempt recorded in the arguments.
    pub fn retry_attempt(&self) -> u64 {
        retry::attempt_from_args(&self.args)
    }
}

/// A job payload as stored in a queue list.
///
/// Wire format: `{"class": .., "args": [{..}], "id": .., "queue_time": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedPayload {
    /// Class identifier
    pub class: String,

    /// Named arguments
    #[serde(with = "args_envelope")]
    pub args: JobArgs,

    /// Job id
    #[serde(default)]
    pub id: JobId,

    /// Unix time (fractional seconds) the payload was pushed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<f64>,
}

impl QueuedPayload {
    /// Create a payload with a fresh id, stamped with the current time.
    pub fn new(class: impl Into<String>, args: JobArgs) -> Self {
        Self {
            class: class.into(),
            args,
            id: generate_id(),
            queue_time: Some(Utc::now().timestamp_micros() as f64 / 1_000_000.0),
        }
    }

    /// Check whether this payload represents the same work as `job`.
    ///
    /// Classes must be equal and the argument maps must hold the same pairs.
    pub fn matches(&self, job: &Job) -> bool {
        self.class == job.class && self.args == job.args
    }
}

/// A job payload as stored in a delayed bucket.
///
/// Wire format: `{"class": .., "args": [{..}], "queue": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayedPayload {
    /// Class identifier
    pub class: String,

    /// Named arguments
    #[serde(with = "args_envelope")]
    pub args: JobArgs,

    /// Queue the job is moved to once due
    pub queue: String,
}

impl DelayedPayload {
    /// Check whether this entry represents the same work as `job`.
    pub fn matches(&self, job: &Job) -> bool {
        self.class == job.class && self.queue == job.queue && self.args == job.args
    }
}

impl From<&Job> for DelayedPayload {
    fn from(job: &Job) -> Self {
        Self {
            class: job.class.clone(),
            args: job.args.clone(),
            queue: job.queue.clone(),
        }
    }
}

impl From<DelayedPayload> for Job {
    fn from(payload: DelayedPayload) -> Self {
        Self {
            class: payload.class,
            queue: payload.queue,
            args: payload.args,
        }
    }
}

/// Serialize a value for storage.
pub(crate) fn encode<T: Serialize>(value: &T) -> QueueResult<String> {
    serde_json::to_string(value).map_err(|e| QueueError::Serialization(e.to_string()))
}

/// Decode stored entries, skipping the ones that fail to parse.
///
/// Returns each decoded value alongside its raw form, plus the number of
/// entries skipped.
pub(crate) fn decode_entries<T: DeserializeOwned>(
    raw: Vec<String>,
    source: &str,
) -> (Vec<(String, T)>, usize) {
    let mut decoded = Vec::with_capacity(raw.len());
    let mut skipped = 0;

    for entry in raw {
        match serde_json::from_str::<T>(&entry) {
            Ok(value) => decoded.push((entry, value)),
            Err(e) => {
                skipped += 1;
                warn!(source, error = %e, "Skipping malformed entry");
            }
        }
    }

    if skipped > 0 {
        warn!(source, skipped, "Malformed entries skipped during scan");
    }

    (decoded, skipped)
}

/// Resque wraps the argument map in a one-element array.
mod args_envelope {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    use super::JobArgs;

    pub fn serialize<S>(args: &JobArgs, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [args].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<JobArgs, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => match items.into_iter().next() {
                Some(Value::Object(args)) => Ok(args),
                Some(Value::Null) | None => Ok(JobArgs::new()),
                Some(other) => Err(D::Error::custom(format!(
                    "expected argument object, got {}",
                    other
                ))),
            },
            Value::Object(args) => Ok(args),
            Value::Null => Ok(JobArgs::new()),
            other => Err(D::Error::custom(format!(
                "expected argument array, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Resize {
        image: String,
        width: u32,
    }

    impl JobType for Resize {
        const CLASS: &'static str = "Media\\Resize";
        const QUEUE: &'static str = "images";
    }

    #[derive(Serialize)]
    struct Ping;

    impl JobType for Ping {
        const CLASS: &'static str = "Ping";
    }

    #[derive(Serialize)]
    struct Bare(u32);

    impl JobType for Bare {
        const CLASS: &'static str = "Bare";
    }

    #[test]
    fn test_job_creation() {
        let job = Job::new("default", "SendEmail").with_arg("to", "user@example.com");

        assert_eq!(job.queue, "default");
        assert_eq!(job.class, "SendEmail");
        assert_eq!(job.args["to"], "user@example.com");
        assert!(job.retry_strategy().is_none());
        assert_eq!(job.retry_attempt(), 0);
    }

    #[test]
    fn test_typed_job() {
        let job = Job::typed(&Resize {
            image: "a.png".into(),
            width: 120,
        })
        .unwrap();

        assert_eq!(job.class, "Media\\Resize");
        assert_eq!(job.queue, "images");
        assert_eq!(job.args["width"], 120);
    }

    #[test]
    fn test_typed_unit_job_has_no_args() {
        let job = Job::typed(&Ping).unwrap();
        assert_eq!(job.queue, DEFAULT_QUEUE);
        assert!(job.args.is_empty());
    }

    #[test]
    fn test_typed_job_rejects_scalar() {
        let err = Job::typed(&Bare(3)).unwrap_err();
        assert!(matches!(err, QueueError::InvalidArguments(_)));
    }

    #[test]
    fn test_args_keep_insertion_order() {
        let job = Job::new("q", "C")
            .with_arg("zeta", 1)
            .with_arg("alpha", 2)
            .with_arg("mid", 3);

        let keys: Vec<&str> = job.args.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_generated_ids_are_unique_hex() {
        let a = generate_id();
        let b = generate_id();

        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_queued_payload_wire_format() {
        let mut args = JobArgs::new();
        args.insert("x".into(), json!(1));
        let payload = QueuedPayload::new("Export", args);

        let value: Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["class"], "Export");
        assert_eq!(value["args"], json!([{"x": 1}]));
        assert_eq!(value["id"], payload.id.as_str());
        assert!(value["queue_time"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_queued_payload_accepts_external_payloads() {
        let raw = r#"{"class":"Export","args":[{"x":1,"resque.retry_attempt":2}],"id":"abc"}"#;
        let payload: QueuedPayload = serde_json::from_str(raw).unwrap();

        assert_eq!(payload.id, "abc");
        assert_eq!(payload.args["resque.retry_attempt"], 2);
        assert_eq!(payload.queue_time, None);

        let empty: QueuedPayload = serde_json::from_str(r#"{"class":"Noop","args":[]}"#).unwrap();
        assert!(empty.args.is_empty());
        assert!(empty.id.is_empty());
    }

    #[test]
    fn test_queued_payload_rejects_scalar_args() {
        let result = serde_json::from_str::<QueuedPayload>(r#"{"class":"C","args":[5]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_payload_matching_requires_equal_argument_sets() {
        let queued = QueuedPayload {
            class: "C".into(),
            args: serde_json::from_value(json!({"x": 1, "y": 2})).unwrap(),
            id: "id".into(),
            queue_time: None,
        };

        let subset = Job::new("q", "C").with_arg("x", 1);
        let same = Job::new("q", "C").with_arg("y", 2).with_arg("x", 1);
        let other_class = Job::new("q", "D").with_arg("x", 1).with_arg("y", 2);

        assert!(!queued.matches(&subset));
        assert!(queued.matches(&same));
        assert!(!queued.matches(&other_class));
    }

    #[test]
    fn test_delayed_payload_matching_includes_queue() {
        let job = Job::new("mail", "Notify").with_arg("user", 9);
        let payload = DelayedPayload::from(&job);

        assert!(payload.matches(&job));
        assert!(!payload.matches(&job.clone().on_queue("other")));
        assert_eq!(Job::from(payload), job);
    }

    #[test]
    fn test_decode_entries_skips_malformed() {
        let raw = vec![
            r#"{"class":"A","args":[{}],"queue":"q"}"#.to_string(),
            "{not json".to_string(),
            r#"{"class":"B","args":[{}],"queue":"q"}"#.to_string(),
        ];

        let (decoded, skipped) = decode_entries::<DelayedPayload>(raw, "test");
        assert_eq!(skipped, 1);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].1.class, "B");
    }
}
