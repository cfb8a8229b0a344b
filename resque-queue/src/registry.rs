//! Registry of known job classes.

use std::collections::HashMap;

use crate::error::{QueueError, QueueResult};
use crate::job::{DEFAULT_QUEUE, JobType};

/// Maps job class identifiers to their default queue.
///
/// An open registry accepts any class, which is what external producers
/// writing raw class names expect. A strict registry rejects classes that
/// were never registered, both when enqueueing and when replaying failures.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    strict: bool,
    classes: HashMap<String, String>,
}

impl JobRegistry {
    /// Registry accepting every class.
    pub fn open() -> Self {
        Self::default()
    }

    /// Registry accepting only registered classes.
    pub fn strict() -> Self {
        Self {
            strict: true,
            classes: HashMap::new(),
        }
    }

    /// Register a typed job.
    pub fn register<T: JobType>(mut self) -> Self {
        self.classes
            .insert(T::CLASS.to_string(), T::QUEUE.to_string());
        self
    }

    /// Register a class by name with its default queue.
    pub fn register_class(mut self, class: impl Into<String>, queue: impl Into<String>) -> Self {
        self.classes.insert(class.into(), queue.into());
        self
    }

    /// Whether unregistered classes are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether the class may be enqueued.
    pub fn accepts(&self, class: &str) -> bool {
        !self.strict || self.classes.contains_key(class)
    }

    /// Fail with [`QueueError::UnknownJobClass`] when the class is rejected.
    pub fn check(&self, class: &str) -> QueueResult<()> {
        if self.accepts(class) {
            Ok(())
        } else {
            Err(QueueError::UnknownJobClass(class.to_string()))
        }
    }

    /// Queue a class is pushed to unless the job names another.
    pub fn default_queue(&self, class: &str) -> QueueResult<&str> {
        match self.classes.get(class) {
            Some(queue) => Ok(queue.as_str()),
            None if !self.strict => Ok(DEFAULT_QUEUE),
            None => Err(QueueError::UnknownJobClass(class.to_string())),
        }
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Invoice;

    impl JobType for Invoice {
        const CLASS: &'static str = "Billing\\Invoice";
        const QUEUE: &'static str = "billing";
    }

    #[test]
    fn test_open_registry_accepts_everything() {
        let registry = JobRegistry::open();
        assert!(registry.accepts("Whatever"));
        assert_eq!(registry.default_queue("Whatever").unwrap(), DEFAULT_QUEUE);
    }

    #[test]
    fn test_strict_registry() {
        let registry = JobRegistry::strict().register::<Invoice>();

        assert!(registry.is_strict());
        assert!(registry.accepts("Billing\\Invoice"));
        assert!(!registry.accepts("Other"));
        assert!(matches!(
            registry.check("Other"),
            Err(QueueError::UnknownJobClass(class)) if class == "Other"
        ));
    }

    #[test]
    fn test_default_queue_lookup() {
        let registry = JobRegistry::strict()
            .register::<Invoice>()
            .register_class("Cleanup", "maintenance");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.default_queue("Billing\\Invoice").unwrap(), "billing");
        assert_eq!(registry.default_queue("Cleanup").unwrap(), "maintenance");
        assert!(registry.default_queue("Missing").is_err());
    }
}
