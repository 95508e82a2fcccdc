//! Error types for the docflow-core library.

use std::time::Duration;

use thiserror::Error;

use crate::pipeline::PipelineError;

/// Main error type for the docflow library.
#[derive(Error, Debug)]
pub enum DocflowError {
    /// Pipeline construction or execution error.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Extraction schema could not be loaded.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error. Fatal at construction time.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure signalled by a single pipeline step.
#[derive(Error, Debug)]
pub enum StepError {
    /// I/O error while reading or writing the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The step cannot handle this kind of document.
    #[error("unsupported document: {0}")]
    Unsupported(String),

    /// A field the step depends on was not filled by an earlier step.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// The step did not finish within its time limit.
    #[error("step timed out after {0:?}")]
    Timeout(Duration),

    /// Any other step failure.
    #[error("{0}")]
    Failed(String),
}

impl StepError {
    /// Build a generic failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors related to PDF text extraction.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to loading extraction schemas.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Schema file could not be read.
    #[error("failed to read schema {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Schema file is not a valid schema document.
    #[error("invalid schema {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The schema root must be an object with properties.
    #[error("schema {0} must have type \"object\" at the root")]
    NotAnObject(String),
}

/// Result type for the docflow library.
pub type Result<T> = std::result::Result<T, DocflowError>;
