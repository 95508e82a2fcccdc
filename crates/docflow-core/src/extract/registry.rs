//! Per-class schema lookup.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use lazy_static::lazy_static;
use tracing::{debug, info};

use super::schema::{CompiledSchema, Schema};
use crate::error::SchemaError;

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("invoice", include_str!("../../schemas/invoice.json")),
    ("receipt", include_str!("../../schemas/receipt.json")),
    ("medical_record", include_str!("../../schemas/medical_record.json")),
    ("contract", include_str!("../../schemas/contract.json")),
    ("resume", include_str!("../../schemas/resume.json")),
    ("generic", include_str!("../../schemas/generic.json")),
];

lazy_static! {
    static ref BUILTIN: BTreeMap<String, Entry> = BUILTIN_SOURCES
        .iter()
        .map(|(class, json)| {
            let schema = Schema::from_json_str(class, json).expect("built-in schema is valid");
            (class.to_string(), Entry::new(schema))
        })
        .collect();
}

#[derive(Debug, Clone)]
struct Entry {
    schema: Schema,
    compiled: Arc<CompiledSchema>,
}

impl Entry {
    fn new(schema: Schema) -> Self {
        let compiled = Arc::new(schema.compile());
        Self { schema, compiled }
    }
}

/// Schemas keyed by document class.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    entries: BTreeMap<String, Entry>,
}

impl SchemaRegistry {
    /// Registry holding no schemas.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registry with the built-in invoice, receipt, medical_record,
    /// contract, resume and generic schemas.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN.clone(),
        }
    }

    /// Register or replace the schema for a class.
    pub fn insert(&mut self, class: impl Into<String>, schema: Schema) {
        self.entries.insert(class.into(), Entry::new(schema));
    }

    /// Load every `<class>.json` in `dir`, replacing schemas of the same class.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, SchemaError> {
        let read_err = |source| SchemaError::Read {
            path: dir.display().to_string(),
            source,
        };

        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(read_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let Some(class) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let schema = Schema::from_file(&path)?;
            debug!("Loaded schema for {} from {}", class, path.display());
            self.insert(class, schema);
            loaded += 1;
        }

        info!("Loaded {} schema(s) from {}", loaded, dir.display());
        Ok(loaded)
    }

    /// Compiled schema for a class, `None` for an unknown class.
    pub fn get(&self, class: &str) -> Option<Arc<CompiledSchema>> {
        self.entries.get(class).map(|e| Arc::clone(&e.compiled))
    }

    /// Source schema for a class.
    pub fn schema(&self, class: &str) -> Option<&Schema> {
        self.entries.get(class).map(|e| &e.schema)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.entries.contains_key(class)
    }

    /// Registered classes in sorted order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
