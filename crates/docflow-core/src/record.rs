//! The document record threaded through every pipeline step.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-document state created once and filled in by each step.
///
/// `content`, `doc_type` and `extracted_data` can only be filled in: the
/// accessors below set or merge them but never clear them, so a downstream
/// step cannot erase what an upstream step produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    file_path: PathBuf,
    /// File size in bytes.
    pub file_size: u64,
    /// Lowercase extension including the dot (".pdf"), empty when none.
    pub file_type: String,
    content: Option<String>,
    doc_type: Option<String>,
    #[serde(default)]
    extracted_data: Map<String, Value>,
    /// Free-form annotations written by steps.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pipeline_steps: Vec<StepOutcome>,
    /// Terminal status, set by the caller after the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    /// Error message accompanying `RecordStatus::Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the record was created.
    pub processed_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create an empty record for a path. Size is zero until inspected.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let file_type = file_type_of(&file_path);
        Self {
            file_path,
            file_size: 0,
            file_type,
            content: None,
            doc_type: None,
            extracted_data: Map::new(),
            metadata: Map::new(),
            pipeline_steps: Vec::new(),
            status: None,
            error: None,
            processed_at: Utc::now(),
        }
    }

    /// Create a record from a file on disk, filling size and type.
    pub fn from_path(file_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let mut record = Self::new(file_path);
        record.file_size = std::fs::metadata(&record.file_path)?.len();
        Ok(record)
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// File name without extension, used to name result artifacts.
    pub fn file_stem(&self) -> &str {
        self.file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Content with surrounding whitespace removed, `None` when blank.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.doc_type.as_deref()
    }

    pub fn set_doc_type(&mut self, doc_type: impl Into<String>) {
        self.doc_type = Some(doc_type.into());
    }

    pub fn extracted_data(&self) -> &Map<String, Value> {
        &self.extracted_data
    }

    /// Merge fields into `extracted_data`. Existing keys are overwritten,
    /// none are removed.
    pub fn merge_extracted(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.extracted_data.insert(key, value);
        }
    }

    /// Audit trail, one entry per attempted step in pipeline order.
    pub fn pipeline_steps(&self) -> &[StepOutcome] {
        &self.pipeline_steps
    }

    pub(crate) fn reset_trail(&mut self) {
        self.pipeline_steps.clear();
    }

    pub(crate) fn push_outcome(&mut self, outcome: StepOutcome) {
        self.pipeline_steps.push(outcome);
    }

    /// Whether the caller marked this record as failed.
    pub fn is_error(&self) -> bool {
        self.status == Some(RecordStatus::Error)
    }

    /// Mark the record as failed with a message.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = Some(RecordStatus::Error);
        self.error = Some(message.into());
    }
}

/// Lowercase extension with a leading dot, or an empty string.
pub fn file_type_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Terminal status of a processed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Processed,
    Error,
}

/// Outcome of one attempted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Error,
}

/// One entry of the `pipeline_steps` audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step name.
    pub step: String,
    /// Zero-based position of the step in the pipeline.
    pub position: usize,
    pub status: StepStatus,
    /// Wall time of a successful step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Failure message of a failed step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn success(step: impl Into<String>, position: usize, duration_seconds: f64) -> Self {
        Self {
            step: step.into(),
            position,
            status: StepStatus::Success,
            duration_seconds: Some(duration_seconds),
            error: None,
        }
    }

    pub fn failure(step: impl Into<String>, position: usize, error: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            position,
            status: StepStatus::Error,
            duration_seconds: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}
