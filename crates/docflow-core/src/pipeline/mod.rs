//! Step pipeline execution engine.

mod cancel;
mod engine;
mod error;
mod metrics;
mod step;

pub use cancel::CancellationToken;
pub use engine::{Pipeline, PipelineBuilder};
pub use error::PipelineError;
pub use metrics::{PipelineMetrics, StepMetrics};
pub use step::{Step, StepHandler};
