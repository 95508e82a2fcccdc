//! Step registration types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::StepError;
use crate::record::DocumentRecord;

/// A unit of work applied to a record.
///
/// Steps talk to the pipeline only through the record: they fill fields in
/// and signal failure through the returned error.
pub trait StepHandler: Send + Sync {
    fn process(&self, record: &mut DocumentRecord) -> Result<(), StepError>;
}

impl<F> StepHandler for F
where
    F: Fn(&mut DocumentRecord) -> Result<(), StepError> + Send + Sync,
{
    fn process(&self, record: &mut DocumentRecord) -> Result<(), StepError> {
        self(record)
    }
}

/// A named step with its escalation policy.
#[derive(Clone)]
pub struct Step {
    name: String,
    handler: Arc<dyn StepHandler>,
    critical: bool,
    timeout: Option<Duration>,
}

impl Step {
    /// Create a non-critical step without a time limit.
    pub fn new(name: impl Into<String>, handler: impl StepHandler + 'static) -> Self {
        Self::from_arc(name, Arc::new(handler))
    }

    /// Create a non-critical step from a closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut DocumentRecord) -> Result<(), StepError> + Send + Sync + 'static,
    {
        Self::from_arc(name, Arc::new(f))
    }

    /// Create a step from a shared handler.
    pub fn from_arc(name: impl Into<String>, handler: Arc<dyn StepHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
            critical: false,
            timeout: None,
        }
    }

    /// Mark the step as critical: its failure aborts the run.
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Fail the step if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn handler(&self) -> &Arc<dyn StepHandler> {
        &self.handler
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("critical", &self.critical)
            .field("timeout", &self.timeout)
            .finish()
    }
}
