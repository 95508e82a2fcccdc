use thiserror::Error;

use crate::error::StepError;
use crate::record::DocumentRecord;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("duplicate step name: {0}")]
    DuplicateStep(String),

    #[error("step name must not be empty (position {0})")]
    EmptyStepName(usize),

    /// A critical step failed. `record` holds the state at the time of the
    /// failure, including the audit trail.
    #[error("critical step '{step}' failed: {source}")]
    CriticalStep {
        step: String,
        #[source]
        source: StepError,
        record: Box<DocumentRecord>,
    },

    #[error("pipeline run cancelled after {} step(s)", .record.pipeline_steps().len())]
    Cancelled { record: Box<DocumentRecord> },
}

impl PipelineError {
    /// The partial record of a failed or cancelled run.
    pub fn record(&self) -> Option<&DocumentRecord> {
        match self {
            Self::CriticalStep { record, .. } | Self::Cancelled { record } => Some(&**record),
            Self::DuplicateStep(_) | Self::EmptyStepName(_) => None,
        }
    }

    /// Take the partial record out of a failed or cancelled run.
    pub fn into_record(self) -> Option<DocumentRecord> {
        match self {
            Self::CriticalStep { record, .. } | Self::Cancelled { record } => Some(*record),
            Self::DuplicateStep(_) | Self::EmptyStepName(_) => None,
        }
    }
}
