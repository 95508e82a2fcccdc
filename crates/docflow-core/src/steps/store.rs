//! JSON result persistence.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::StepError;
use crate::pipeline::StepHandler;
use crate::record::{DocumentRecord, RecordStatus};

/// Writes records as pretty JSON under the processed and failed directories.
#[derive(Debug, Clone)]
pub struct JsonStore {
    processed_dir: PathBuf,
    failed_dir: PathBuf,
}

impl JsonStore {
    pub fn new(processed_dir: impl Into<PathBuf>, failed_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
            failed_dir: failed_dir.into(),
        }
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    pub fn failed_dir(&self) -> &Path {
        &self.failed_dir
    }

    /// Path of the result artifact for a record: `<stem>_result.json`, or
    /// `<stem>_<n>_result.json` when that name belongs to another source file.
    pub fn result_path(&self, record: &DocumentRecord) -> PathBuf {
        artifact_path(&self.processed_dir, record, "result")
    }

    /// Path of the error artifact for a record, named like
    /// [`result_path`](Self::result_path).
    pub fn error_path(&self, record: &DocumentRecord) -> PathBuf {
        artifact_path(&self.failed_dir, record, "error")
    }

    /// Persist a successfully processed record. The stored copy carries
    /// `status = processed`.
    pub fn write_result(&self, record: &DocumentRecord) -> Result<PathBuf, StepError> {
        let mut stored = record.clone();
        stored.status = Some(RecordStatus::Processed);
        let path = self.result_path(record);
        write_json(&path, &stored)?;
        info!("Stored result at {}", path.display());
        Ok(path)
    }

    /// Persist a failed record as-is.
    pub fn write_error(&self, record: &DocumentRecord) -> Result<PathBuf, StepError> {
        let path = self.error_path(record);
        write_json(&path, record)?;
        info!("Stored error record at {}", path.display());
        Ok(path)
    }
}

fn artifact_path(dir: &Path, record: &DocumentRecord, suffix: &str) -> PathBuf {
    let stem = record.file_stem();
    let mut path = dir.join(format!("{stem}_{suffix}.json"));
    let mut n = 1;

    while let Some(owner) = artifact_owner(&path) {
        if owner.as_path() == record.file_path() {
            break;
        }
        if n == 1 {
            warn!(
                "{} already holds results for {}, choosing another name for {}",
                path.display(),
                owner.display(),
                record.file_path().display()
            );
        }
        n += 1;
        path = dir.join(format!("{stem}_{n}_{suffix}.json"));
    }
    path
}

/// Source file recorded in an existing artifact.
fn artifact_owner(path: &Path) -> Option<PathBuf> {
    let content = std::fs::read_to_string(path).ok()?;
    let stored: serde_json::Value = serde_json::from_str(&content).ok()?;
    stored.get("file_path")?.as_str().map(PathBuf::from)
}

fn write_json(path: &Path, record: &DocumentRecord) -> Result<(), StepError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(record)?;
    std::fs::write(path, content)?;
    Ok(())
}

impl StepHandler for JsonStore {
    fn process(&self, record: &mut DocumentRecord) -> Result<(), StepError> {
        let path = self.write_result(record)?;
        record.metadata.insert(
            "result_path".to_string(),
            serde_json::Value::String(path.display().to_string()),
        );
        Ok(())
    }
}
