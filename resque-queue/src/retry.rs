//! Retry strategies and their resolution per job class.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::job::{Job, JobArgs, RETRY_ATTEMPT_KEY, RETRY_STRATEGY_KEY};

/// Wait times in seconds, one per retry attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryStrategy(Vec<u64>);

impl RetryStrategy {
    /// Create a strategy from wait times in seconds.
    pub fn new(waits: impl IntoIterator<Item = u64>) -> Self {
        Self(waits.into_iter().collect())
    }

    /// Wait times in seconds.
    pub fn waits(&self) -> &[u64] {
        &self.0
    }

    /// Number of configured attempts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// An empty strategy disables retries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Delay before the given attempt.
    pub fn delay_for(&self, attempt: u64) -> Option<Duration> {
        usize::try_from(attempt)
            .ok()
            .and_then(|index| self.0.get(index))
            .map(|secs| Duration::from_secs(*secs))
    }

    /// Whether `attempt` is the final configured attempt.
    pub fn is_last_attempt(&self, attempt: u64) -> bool {
        !self.is_empty() && attempt == (self.0.len() - 1) as u64
    }
}

impl From<Vec<u64>> for RetryStrategy {
    fn from(waits: Vec<u64>) -> Self {
        Self(waits)
    }
}

/// Resolves which retry strategy applies to a job class.
///
/// A per-class entry always wins over the global strategy, even when the
/// entry is empty: an empty entry is an explicit opt-out.
///
/// ```
/// use resque_queue::{RetryStrategy, RetryStrategyResolver};
///
/// let resolver = RetryStrategyResolver::new()
///     .with_global(vec![5, 30])
///     .with_job("Report", Vec::<u64>::new());
///
/// assert_eq!(resolver.resolve("Mail"), Some(&RetryStrategy::new(vec![5, 30])));
/// assert_eq!(resolver.resolve("Report"), Some(&RetryStrategy::default()));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryStrategyResolver {
    /// Strategy applied to every class without its own entry
    #[serde(default)]
    global: RetryStrategy,

    /// Per-class overrides
    #[serde(default)]
    jobs: HashMap<String, RetryStrategy>,
}

impl RetryStrategyResolver {
    /// Create a resolver with no strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global strategy.
    pub fn with_global(mut self, waits: impl IntoIterator<Item = u64>) -> Self {
        self.global = RetryStrategy::new(waits);
        self
    }

    /// Set the strategy for one job class.
    pub fn with_job(mut self, class: impl Into<String>, waits: impl IntoIterator<Item = u64>) -> Self {
        self.jobs.insert(class.into(), RetryStrategy::new(waits));
        self
    }

    /// The global strategy.
    pub fn global(&self) -> &RetryStrategy {
        &self.global
    }

    /// Resolve the strategy for a class.
    pub fn resolve(&self, class: &str) -> Option<&RetryStrategy> {
        if let Some(strategy) = self.jobs.get(class) {
            return Some(strategy);
        }

        if self.global.is_empty() {
            None
        } else {
            Some(&self.global)
        }
    }

    /// Write the resolved strategy into the job's arguments.
    pub fn attach(&self, job: &mut Job) {
        if let Some(strategy) = self.resolve(&job.class) {
            job.args
                .insert(RETRY_STRATEGY_KEY.to_string(), strategy.waits().into());
        }
    }
}

/// Read the retry strategy snapshot from job arguments.
pub fn strategy_from_args(args: &JobArgs) -> Option<RetryStrategy> {
    args.get(RETRY_STRATEGY_KEY)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

/// Read the retry attempt from job arguments, defaulting to zero.
pub fn attempt_from_args(args: &JobArgs) -> u64 {
    match args.get(RETRY_ATTEMPT_KEY) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Reset the retry attempt when the arguments carry a strategy.
pub fn reset_attempt(args: &mut JobArgs) {
    if strategy_from_args(args).is_some_and(|s| !s.is_empty()) {
        args.insert(RETRY_ATTEMPT_KEY.to_string(), Value::from(0));
    }
}
