//! Core library for document processing.
//!
//! This crate provides:
//! - A step pipeline that threads a [`DocumentRecord`] through named steps,
//!   with per-step metrics and a critical-step abort policy
//! - Weighted keyword classification with an extension fallback
//! - Regex schema field extraction with type coercion and default filling
//! - Built-in steps for file inspection, text extraction and JSON persistence

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod processor;
pub mod record;
pub mod steps;

pub use classify::{Classification, ClassificationTier, Classifier, DocumentClass, classify};
pub use config::DocflowConfig;
pub use error::{DocflowError, Result, StepError};
pub use extract::{ExtractMode, FieldKind, FieldSpec, Schema, SchemaRegistry, extract};
pub use pipeline::{
    CancellationToken, Pipeline, PipelineBuilder, PipelineError, PipelineMetrics, Step,
    StepHandler, StepMetrics,
};
pub use processor::DocumentProcessor;
pub use record::{DocumentRecord, RecordStatus, StepOutcome, StepStatus};
