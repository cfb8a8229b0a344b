//! Queue layer configuration.

use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::job::JobType;
use crate::keys::DEFAULT_PREFIX;
use crate::registry::JobRegistry;
use crate::retry::RetryStrategyResolver;

/// Configuration built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct ResqueConfig {
    /// Namespace prepended to every key
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Retry strategies
    #[serde(default)]
    pub retry: RetryStrategyResolver,

    /// Known job classes
    #[serde(skip)]
    pub registry: JobRegistry,

    /// Workers without a heartbeat for this long are pruned
    #[serde(with = "duration_secs", default = "default_heartbeat_expiry")]
    pub heartbeat_expiry: Duration,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_heartbeat_expiry() -> Duration {
    Duration::from_secs(300)
}

impl Default for ResqueConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            retry: RetryStrategyResolver::default(),
            registry: JobRegistry::default(),
            heartbeat_expiry: default_heartbeat_expiry(),
        }
    }
}

impl ResqueConfig {
    /// Create a builder.
    pub fn builder() -> ResqueConfigBuilder {
        ResqueConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    ///
    /// - `RESQUE_PREFIX` - key namespace
    /// - `RESQUE_RETRY_STRATEGY` - global strategy as comma-separated seconds
    /// - `RESQUE_WORKER_HEARTBEAT_EXPIRY` - seconds before a silent worker is pruned
    pub fn from_env() -> ResqueConfigBuilder {
        let mut builder = ResqueConfigBuilder::new();

        if let Ok(prefix) = std::env::var("RESQUE_PREFIX") {
            builder = builder.prefix(prefix);
        }

        if let Ok(strategy) = std::env::var("RESQUE_RETRY_STRATEGY") {
            match parse_strategy(&strategy) {
                Some(waits) => builder = builder.global_retry_strategy(waits),
                None => warn!(value = %strategy, "Ignoring invalid RESQUE_RETRY_STRATEGY"),
            }
        }

        if let Ok(expiry) = std::env::var("RESQUE_WORKER_HEARTBEAT_EXPIRY") {
            match parse_expiry(&expiry) {
                Some(expiry) => builder = builder.heartbeat_expiry(expiry),
                None => {
                    warn!(value = %expiry, "Ignoring invalid RESQUE_WORKER_HEARTBEAT_EXPIRY")
                }
            }
        }

        builder
    }
}

fn parse_strategy(value: &str) -> Option<Vec<u64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

fn parse_expiry(value: &str) -> Option<Duration> {
    value.trim().parse().ok().map(Duration::from_secs)
}

/// Builder for [`ResqueConfig`].
#[derive(Default)]
pub struct ResqueConfigBuilder {
    config: ResqueConfig,
}

impl ResqueConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: ResqueConfig::default(),
        }
    }

    /// Set the key namespace.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Set the strategy applied to every class without its own entry.
    pub fn global_retry_strategy(mut self, waits: impl IntoIterator<Item = u64>) -> Self {
        self.config.retry = self.config.retry.with_global(waits);
        self
    }

    /// Set the strategy for one class. An empty list disables retries for it.
    pub fn job_retry_strategy(
        mut self,
        class: impl Into<String>,
        waits: impl IntoIterator<Item = u64>,
    ) -> Self {
        self.config.retry = self.config.retry.with_job(class, waits);
        self
    }

    /// Replace the job registry.
    pub fn registry(mut self, registry: JobRegistry) -> Self {
        self.config.registry = registry;
        self
    }

    /// Register a typed job with the current registry.
    pub fn register<T: JobType>(mut self) -> Self {
        self.config.registry = self.config.registry.register::<T>();
        self
    }

    /// Set the heartbeat expiry used when pruning workers.
    pub fn heartbeat_expiry(mut self, expiry: Duration) -> Self {
        self.config.heartbeat_expiry = expiry;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ResqueConfig {
        self.config
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
