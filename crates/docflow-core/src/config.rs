//! Configuration for the processing pipeline.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{Classifier, DocumentClass};
use crate::error::{DocflowError, Result};
use crate::extract::SchemaRegistry;

/// Main configuration for docflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocflowConfig {
    /// Where results and error artifacts are written.
    pub storage: StorageConfig,

    /// Pipeline execution settings.
    pub pipeline: PipelineConfig,

    /// Content classification settings.
    pub classification: ClassificationConfig,

    /// Field extraction settings.
    pub extraction: ExtractionConfig,
}

/// Result persistence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for `<stem>_result.json` files.
    pub processed_dir: PathBuf,

    /// Directory for `<stem>_error.json` files.
    pub failed_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            processed_dir: PathBuf::from("data/processed"),
            failed_dir: PathBuf::from("data/failed"),
        }
    }
}

/// Pipeline execution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of documents processed in parallel in batch mode.
    pub workers: usize,

    /// Time limit for text extraction, in seconds.
    pub step_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            step_timeout_secs: None,
        }
    }
}

/// Classification configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Replacement class table. `None` uses the built-in table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<DocumentClass>>,
}

/// Extraction configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Directory of `<class>.json` schemas overriding the built-ins.
    pub schema_dir: Option<PathBuf>,

    /// Report every schema field, zero-filling unmatched ones.
    pub fill_defaults: bool,

    /// Schema used for classes without one of their own.
    pub fallback_schema: Option<String>,
}

impl DocflowConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.workers == 0 {
            return Err(config_error("pipeline.workers must be at least 1"));
        }
        if self.pipeline.step_timeout_secs == Some(0) {
            return Err(config_error("pipeline.step_timeout_secs must be positive"));
        }
        if self.storage.processed_dir.as_os_str().is_empty() {
            return Err(config_error("storage.processed_dir must not be empty"));
        }
        if self.storage.failed_dir.as_os_str().is_empty() {
            return Err(config_error("storage.failed_dir must not be empty"));
        }

        if let Some(classes) = &self.classification.classes {
            if classes.is_empty() {
                return Err(config_error("classification.classes must not be empty"));
            }
            let mut seen = HashSet::new();
            for class in classes {
                if class.label.trim().is_empty() {
                    return Err(config_error("class label must not be empty"));
                }
                if !seen.insert(class.label.as_str()) {
                    return Err(config_error(&format!("duplicate class label '{}'", class.label)));
                }
                if class.weight.is_nan() || class.weight <= 0.0 {
                    return Err(config_error(&format!("class '{}' must have a positive weight", class.label)));
                }
                if class.indicators.iter().all(|i| i.trim().is_empty()) {
                    return Err(config_error(&format!("class '{}' has no indicators", class.label)));
                }
            }
        }

        if let Some(dir) = &self.extraction.schema_dir {
            if !dir.is_dir() {
                return Err(config_error(&format!(
                    "extraction.schema_dir {} is not a directory",
                    dir.display()
                )));
            }
        }

        Ok(())
    }

    /// Classifier over the configured class table.
    pub fn classifier(&self) -> Classifier {
        match &self.classification.classes {
            Some(classes) => Classifier::with_classes(classes),
            None => Classifier::new(),
        }
    }

    /// Built-in schemas plus those in `extraction.schema_dir`.
    pub fn schema_registry(&self) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::builtin();
        if let Some(dir) = &self.extraction.schema_dir {
            registry.load_dir(dir)?;
        }
        if let Some(fallback) = &self.extraction.fallback_schema {
            if !registry.contains(fallback) {
                return Err(config_error(&format!("unknown fallback_schema '{}'", fallback)));
            }
        }
        Ok(registry)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.pipeline.step_timeout_secs.map(Duration::from_secs)
    }
}

fn config_error(message: &str) -> DocflowError {
    DocflowError::Config(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DocflowConfig::default();
        assert_eq!(config.storage.processed_dir, PathBuf::from("data/processed"));
        assert_eq!(config.storage.failed_dir, PathBuf::from("data/failed"));
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.step_timeout(), None);
        assert!(!config.extraction.fill_defaults);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DocflowConfig =
            serde_json::from_str(r#"{"pipeline": {"step_timeout_secs": 30}}"#).unwrap();
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.step_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DocflowConfig::default();
        config.pipeline.workers = 2;
        config.extraction.fill_defaults = true;
        config.save(&path).unwrap();

        let loaded = DocflowConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let mut config = DocflowConfig::default();
        config.pipeline.workers = 0;
        assert!(matches!(config.validate(), Err(DocflowError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_class_table() {
        let mut config = DocflowConfig::default();

        config.classification.classes = Some(vec![]);
        assert!(config.validate().is_err());

        config.classification.classes = Some(vec![
            DocumentClass::new("memo", 1.0, &["memo"]),
            DocumentClass::new("memo", 1.0, &["memorandum"]),
        ]);
        assert!(config.validate().is_err());

        config.classification.classes = Some(vec![DocumentClass::new("memo", 0.0, &["memo"])]);
        assert!(config.validate().is_err());

        config.classification.classes = Some(vec![DocumentClass::new("memo", 1.0, &[])]);
        assert!(config.validate().is_err());

        config.classification.classes = Some(vec![DocumentClass::new("memo", 1.0, &["memo"])]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_classes_drive_classifier() {
        let mut config = DocflowConfig::default();
        config.classification.classes = Some(vec![DocumentClass::new("memo", 1.0, &["memo"])]);
        let result = config.classifier().classify("internal memo", ".txt");
        assert_eq!(result.label, "memo");
    }

    #[test]
    fn test_missing_schema_dir_rejected() {
        let mut config = DocflowConfig::default();
        config.extraction.schema_dir = Some(PathBuf::from("/definitely/not/here"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fallback_schema() {
        let mut config = DocflowConfig::default();
        config.extraction.fallback_schema = Some("nope".to_string());
        assert!(matches!(config.schema_registry(), Err(DocflowError::Config(_))));

        config.extraction.fallback_schema = Some("generic".to_string());
        assert!(config.schema_registry().is_ok());
    }
}
