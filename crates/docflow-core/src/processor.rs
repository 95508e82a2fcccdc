//! Single-document processing entry point.

use std::path::Path;

use tracing::{error, info, warn};

use crate::config::DocflowConfig;
use crate::error::Result;
use crate::pipeline::{CancellationToken, Pipeline, PipelineError, PipelineMetrics};
use crate::record::{DocumentRecord, RecordStatus};
use crate::steps::{self, JsonStore};

/// Runs documents through a pipeline and settles their final status.
#[derive(Debug)]
pub struct DocumentProcessor {
    pipeline: Pipeline,
    store: JsonStore,
}

impl DocumentProcessor {
    /// Validate the configuration and build the default pipeline.
    pub fn new(config: &DocflowConfig) -> Result<Self> {
        config.validate()?;
        let pipeline = steps::default_pipeline(config)?;
        let store = JsonStore::new(&config.storage.processed_dir, &config.storage.failed_dir);
        Ok(Self::with_pipeline(pipeline, store))
    }

    /// Use a custom pipeline. `store` receives error artifacts.
    pub fn with_pipeline(pipeline: Pipeline, store: JsonStore) -> Self {
        Self { pipeline, store }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.pipeline.metrics()
    }

    /// Process one file. Never fails: problems are reported through the
    /// returned record's `status` and `error`.
    pub fn process(&self, path: &Path) -> DocumentRecord {
        self.process_with(path, &CancellationToken::new())
    }

    /// Like [`process`](Self::process), stopping early when `cancel` fires.
    pub fn process_with(&self, path: &Path, cancel: &CancellationToken) -> DocumentRecord {
        info!("Processing document: {}", path.display());

        let record = match DocumentRecord::from_path(path) {
            Ok(record) => record,
            Err(e) => {
                let mut record = DocumentRecord::new(path);
                record.mark_error(format!("cannot read {}: {}", path.display(), e));
                self.persist_error(&record);
                return record;
            }
        };

        match self.pipeline.run_with(&record, cancel) {
            Ok(mut done) => {
                done.status = Some(RecordStatus::Processed);
                info!(
                    "Processed {} as {}",
                    path.display(),
                    done.doc_type().unwrap_or("unknown")
                );
                done
            }
            Err(PipelineError::Cancelled { record }) => {
                let mut record = *record;
                warn!("Processing of {} cancelled", path.display());
                record.mark_error("processing cancelled");
                record
            }
            Err(e) => {
                let message = e.to_string();
                error!("Failed to process {}: {}", path.display(), message);
                let mut failed = e.into_record().unwrap_or(record);
                failed.mark_error(message);
                self.persist_error(&failed);
                failed
            }
        }
    }

    fn persist_error(&self, record: &DocumentRecord) {
        if let Err(e) = self.store.write_error(record) {
            error!("Could not write error record for {}: {}", record.file_path().display(), e);
        }
    }
}
