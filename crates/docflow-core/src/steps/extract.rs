//! Field extraction step.

use std::sync::Arc;

use serde_json::Map;
use tracing::debug;

use crate::error::StepError;
use crate::extract::{CompiledSchema, ExtractMode, SchemaRegistry};
use crate::pipeline::StepHandler;
use crate::record::DocumentRecord;

/// Extracts schema fields for the record's `doc_type` into `extracted_data`.
#[derive(Debug, Clone)]
pub struct ExtractStep {
    registry: SchemaRegistry,
    fill_defaults: bool,
    fallback: Option<String>,
}

impl ExtractStep {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            fill_defaults: false,
            fallback: None,
        }
    }

    /// Report every schema field, zero-filling unmatched ones.
    pub fn fill_defaults(mut self, fill: bool) -> Self {
        self.fill_defaults = fill;
        self
    }

    /// Schema used, filled with defaults, for classes without a schema.
    pub fn with_fallback(mut self, class: impl Into<String>) -> Self {
        self.fallback = Some(class.into());
        self
    }

    fn mode(&self) -> ExtractMode {
        if self.fill_defaults {
            ExtractMode::Filled
        } else {
            ExtractMode::Sparse
        }
    }

    fn fallback_schema(&self) -> Option<Arc<CompiledSchema>> {
        self.fallback.as_deref().and_then(|class| self.registry.get(class))
    }
}

impl Default for ExtractStep {
    fn default() -> Self {
        Self::new(SchemaRegistry::builtin())
    }
}

impl StepHandler for ExtractStep {
    fn process(&self, record: &mut DocumentRecord) -> Result<(), StepError> {
        let doc_type = record
            .doc_type()
            .ok_or_else(|| StepError::MissingInput("doc_type".to_string()))?
            .to_string();

        let fields = match self.registry.get(&doc_type) {
            Some(schema) => match record.text() {
                Some(text) => schema.extract(text, self.mode()),
                None if self.fill_defaults => schema.filled_defaults(),
                None => Map::new(),
            },
            None => {
                debug!("No extraction schema for class {}", doc_type);
                self.fallback_schema()
                    .map(|schema| schema.filled_defaults())
                    .unwrap_or_default()
            }
        };

        debug!("Extracted {} top-level field(s) for {}", fields.len(), doc_type);
        record.merge_extracted(fields);
        Ok(())
    }
}
