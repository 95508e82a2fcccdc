//! Extraction schema model and compilation.

use std::collections::BTreeMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::SchemaError;

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    String,
    Number,
    Integer,
    Array,
    Object,
}

/// One field of an extraction schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    /// Regex patterns in priority order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
    /// Value used when no pattern matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Child fields of an `object` field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, FieldSpec>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_patterns(mut self, patterns: &[&str]) -> Self {
        self.patterns = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, field: FieldSpec) -> Self {
        self.properties.insert(name.into(), field);
        self
    }
}

/// A field schema for one document class.
///
/// The JSON form is `{"type": "object", "properties": {...}}`. Property
/// names may be dotted (`vendor.tax_id`) to write into nested objects.
/// With `"case_insensitive": true` every pattern ignores letter case;
/// `(?-i:...)` turns it back on for part of a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", default = "object_kind")]
    kind: FieldKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub case_insensitive: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, FieldSpec>,
}

fn object_kind() -> FieldKind {
    FieldKind::Object
}

impl Schema {
    pub fn new() -> Self {
        Self {
            kind: FieldKind::Object,
            case_insensitive: false,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: FieldSpec) -> Self {
        self.properties.insert(name.into(), field);
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Parse a schema document. `origin` names it in errors.
    pub fn from_json_str(origin: &str, json: &str) -> Result<Self, SchemaError> {
        let schema: Schema = serde_json::from_str(json).map_err(|source| SchemaError::Invalid {
            path: origin.to_string(),
            source,
        })?;
        if schema.kind != FieldKind::Object {
            return Err(SchemaError::NotAnObject(origin.to_string()));
        }
        Ok(schema)
    }

    /// Load a schema file.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let origin = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: origin.clone(),
            source,
        })?;
        Self::from_json_str(&origin, &json)
    }

    /// Compile every pattern. Patterns that fail to compile are skipped.
    pub fn compile(&self) -> CompiledSchema {
        let mut skipped = Vec::new();
        let fields = compile_fields(&self.properties, "", self.case_insensitive, &mut skipped);
        CompiledSchema { fields, skipped }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// A pattern that failed to compile.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPattern {
    /// Full dotted path of the field.
    pub field: String,
    pub pattern: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledField {
    pub name: String,
    pub kind: FieldKind,
    pub patterns: Vec<Regex>,
    pub default: Option<Value>,
    pub children: Vec<CompiledField>,
}

/// A schema with its patterns compiled, ready to run against text.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub(crate) fields: Vec<CompiledField>,
    skipped: Vec<SkippedPattern>,
}

impl CompiledSchema {
    /// Patterns dropped at compile time.
    pub fn skipped_patterns(&self) -> &[SkippedPattern] {
        &self.skipped
    }
}

fn compile_fields(
    properties: &BTreeMap<String, FieldSpec>,
    prefix: &str,
    case_insensitive: bool,
    skipped: &mut Vec<SkippedPattern>,
) -> Vec<CompiledField> {
    properties
        .iter()
        .map(|(name, spec)| {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };

            let mut patterns = Vec::with_capacity(spec.patterns.len());
            for pattern in &spec.patterns {
                match RegexBuilder::new(pattern).case_insensitive(case_insensitive).build() {
                    Ok(re) => patterns.push(re),
                    Err(e) => {
                        warn!("Skipping malformed pattern for field {}: {}", path, e);
                        skipped.push(SkippedPattern {
                            field: path.clone(),
                            pattern: pattern.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            CompiledField {
                name: name.clone(),
                kind: spec.kind,
                patterns,
                default: spec.default.clone(),
                children: compile_fields(&spec.properties, &path, case_insensitive, skipped),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_schema_document() {
        let schema = Schema::from_json_str(
            "inline",
            r#"{
                "type": "object",
                "properties": {
                    "total": {"type": "number", "patterns": ["Total:\\s*(\\S+)"]},
                    "vendor": {"type": "object", "properties": {"name": {"type": "string"}}},
                    "notes": {"type": "string", "default": "n/a"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(schema.properties["total"].kind, FieldKind::Number);
        assert_eq!(schema.properties["total"].patterns, vec!["Total:\\s*(\\S+)"]);
        assert_eq!(schema.properties["vendor"].properties["name"].kind, FieldKind::String);
        assert_eq!(schema.properties["notes"].default, Some(json!("n/a")));
    }

    #[test]
    fn test_root_must_be_object() {
        let err = Schema::from_json_str("bad", r#"{"type": "string"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::NotAnObject(_)));
    }

    #[test]
    fn test_invalid_json() {
        let err = Schema::from_json_str("bad", "{not json").unwrap_err();
        assert!(matches!(err, SchemaError::Invalid { .. }));
    }

    #[test]
    fn test_malformed_pattern_skipped() {
        let schema = Schema::new().with_field(
            "id",
            FieldSpec::new(FieldKind::String).with_patterns(&["(unclosed", r"ID:\s*(\w+)"]),
        );
        let compiled = schema.compile();

        assert_eq!(compiled.skipped_patterns().len(), 1);
        assert_eq!(compiled.skipped_patterns()[0].field, "id");
        assert_eq!(compiled.skipped_patterns()[0].pattern, "(unclosed");
        assert_eq!(compiled.fields[0].patterns.len(), 1);
    }

    #[test]
    fn test_nested_skipped_pattern_reports_full_path() {
        let schema = Schema::new().with_field(
            "vendor",
            FieldSpec::new(FieldKind::Object)
                .with_property("name", FieldSpec::new(FieldKind::String).with_patterns(&["[z-a]"])),
        );
        let compiled = schema.compile();
        assert_eq!(compiled.skipped_patterns()[0].field, "vendor.name");
    }

    #[test]
    fn test_case_insensitive_schema() {
        let schema = Schema::from_json_str(
            "inline",
            r#"{"type": "object", "case_insensitive": true,
                "properties": {"code": {"patterns": ["Code:\\s*((?-i:[A-Z]+))"]}}}"#,
        )
        .unwrap();
        assert!(schema.case_insensitive);

        let compiled = schema.compile();
        let re = &compiled.fields[0].patterns[0];
        assert_eq!(&re.captures("CODE: ABC").unwrap()[1], "ABC");
        assert_eq!(&re.captures("code: ABC").unwrap()[1], "ABC");
        assert!(re.captures("code: abc").is_none());
    }

    #[test]
    fn test_patterns_case_sensitive_by_default() {
        let compiled = Schema::new()
            .with_field("id", FieldSpec::new(FieldKind::String).with_patterns(&[r"ID:\s*(\w+)"]))
            .compile();
        assert!(compiled.fields[0].patterns[0].is_match("ID: 7"));
        assert!(!compiled.fields[0].patterns[0].is_match("id: 7"));

        let compiled = Schema::new()
            .ignore_case()
            .with_field("id", FieldSpec::new(FieldKind::String).with_patterns(&[r"ID:\s*(\w+)"]))
            .compile();
        assert!(compiled.fields[0].patterns[0].is_match("id: 7"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.json");
        std::fs::write(&path, r#"{"type":"object","properties":{"to":{"type":"string"}}}"#).unwrap();

        let schema = Schema::from_file(&path).unwrap();
        assert!(schema.properties.contains_key("to"));

        let missing = Schema::from_file(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, SchemaError::Read { .. }));
    }
}
