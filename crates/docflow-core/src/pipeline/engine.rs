//! Sequential step runner.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info_span, warn};

use crate::error::StepError;
use crate::record::{DocumentRecord, StepOutcome};

use super::cancel::CancellationToken;
use super::error::PipelineError;
use super::metrics::{MetricsTable, PipelineMetrics};
use super::step::Step;

/// Ordered list of named steps applied to a document record.
///
/// A `Pipeline` is shared freely across threads: each [`run`](Self::run)
/// works on its own copy of the record, and the only shared state is the
/// per-step metrics.
#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<Step>,
    metrics: MetricsTable,
}

impl Pipeline {
    /// Create a pipeline. Step names must be unique and non-empty.
    pub fn new(steps: Vec<Step>) -> Result<Self, PipelineError> {
        let mut seen = HashSet::new();
        for (position, step) in steps.iter().enumerate() {
            if step.name().is_empty() {
                return Err(PipelineError::EmptyStepName(position));
            }
            if !seen.insert(step.name()) {
                return Err(PipelineError::DuplicateStep(step.name().to_string()));
            }
        }

        let metrics = MetricsTable::new(steps.iter().map(Step::name));
        Ok(Self { steps, metrics })
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run a record through every step in declaration order.
    ///
    /// The caller's record is not modified. Failures of non-critical steps
    /// are recorded in the audit trail and the run continues; a critical
    /// failure stops the run and is returned with the partial record.
    pub fn run(&self, record: &DocumentRecord) -> Result<DocumentRecord, PipelineError> {
        self.run_with(record, &CancellationToken::new())
    }

    /// Like [`run`](Self::run), checking `cancel` before each step.
    pub fn run_with(
        &self,
        record: &DocumentRecord,
        cancel: &CancellationToken,
    ) -> Result<DocumentRecord, PipelineError> {
        let mut current = record.clone();
        current.reset_trail();

        let _run = info_span!("pipeline", file = %current.file_path().display()).entered();

        for (position, step) in self.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Pipeline cancelled before step {}", step.name());
                return Err(PipelineError::Cancelled {
                    record: Box::new(current),
                });
            }

            let _step = info_span!("step", name = step.name(), position).entered();
            debug!("Running pipeline step: {}", step.name());

            let start = Instant::now();
            match invoke(step, &mut current) {
                Ok(()) => {
                    let elapsed = start.elapsed();
                    self.metrics.record_success(position, elapsed);
                    current.push_outcome(StepOutcome::success(
                        step.name(),
                        position,
                        elapsed.as_secs_f64(),
                    ));
                    debug!("Step {} completed in {:.2?}", step.name(), elapsed);
                }
                Err(e) => {
                    self.metrics.record_error(position);
                    current.push_outcome(StepOutcome::failure(step.name(), position, e.to_string()));

                    if step.is_critical() {
                        error!("Critical step {} failed: {}", step.name(), e);
                        return Err(PipelineError::CriticalStep {
                            step: step.name().to_string(),
                            source: e,
                            record: Box::new(current),
                        });
                    }
                    warn!("Error in pipeline step {}: {}", step.name(), e);
                }
            }
        }

        Ok(current)
    }

    /// Snapshot of the accumulated per-step metrics.
    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics.snapshot()
    }
}

/// Run one step. A panicking handler is reported as a failure of that step.
fn invoke(step: &Step, record: &mut DocumentRecord) -> Result<(), StepError> {
    match step.timeout() {
        None => panic::catch_unwind(AssertUnwindSafe(|| step.handler().process(record)))
            .unwrap_or_else(|payload| Err(panicked(step.name(), payload))),
        Some(limit) => invoke_with_timeout(step, record, limit),
    }
}

fn panicked(name: &str, payload: Box<dyn Any + Send>) -> StepError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    StepError::failed(format!("step {} panicked: {}", name, message))
}

/// Run the handler on a helper thread over a copy of the record. On timeout
/// the record is left as it was and the helper is detached.
fn invoke_with_timeout(
    step: &Step,
    record: &mut DocumentRecord,
    limit: Duration,
) -> Result<(), StepError> {
    let handler = Arc::clone(step.handler());
    let name = step.name().to_string();
    let mut working = record.clone();
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name(format!("step-{}", step.name()))
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler.process(&mut working)))
                .unwrap_or_else(|payload| Err(panicked(&name, payload)));
            let _ = tx.send((working, result));
        })?;

    match rx.recv_timeout(limit) {
        Ok((working, result)) => {
            *record = working;
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => Err(StepError::Timeout(limit)),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(StepError::failed(format!("step {} panicked", step.name())))
        }
    }
}

/// Incremental pipeline construction.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    steps: Vec<Step>,
}

impl PipelineBuilder {
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        Pipeline::new(self.steps)
    }
}
