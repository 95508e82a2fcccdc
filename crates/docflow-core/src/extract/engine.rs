//! Applies a compiled schema to text.

use serde_json::{Map, Value};

use super::coerce::{coerce, first_capture, zero_value};
use super::schema::{CompiledField, CompiledSchema, FieldKind, Schema};

/// How unmatched fields are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractMode {
    /// Unmatched fields without a default are omitted.
    #[default]
    Sparse,
    /// Every field is present: match, else default, else zero value.
    Filled,
}

/// Extract fields from `text`. Never fails; the worst case is an empty or
/// zero-filled map.
pub fn extract(text: &str, schema: &Schema, mode: ExtractMode) -> Map<String, Value> {
    schema.compile().extract(text, mode)
}

impl CompiledSchema {
    pub fn extract(&self, text: &str, mode: ExtractMode) -> Map<String, Value> {
        let mut out = Map::new();
        extract_fields(&self.fields, text, mode, &mut out);
        out
    }

    /// Every field set to its default or zero value.
    pub fn filled_defaults(&self) -> Map<String, Value> {
        self.extract("", ExtractMode::Filled)
    }
}

fn extract_fields(fields: &[CompiledField], text: &str, mode: ExtractMode, out: &mut Map<String, Value>) {
    for field in fields {
        if let Some(value) = extract_field(field, text, mode) {
            insert_path(out, &field.name, value);
        }
    }
}

fn extract_field(field: &CompiledField, text: &str, mode: ExtractMode) -> Option<Value> {
    if field.kind == FieldKind::Object {
        let mut nested = Map::new();
        extract_fields(&field.children, text, mode, &mut nested);
        if !nested.is_empty() {
            return Some(Value::Object(nested));
        }
        return match (&field.default, mode) {
            (Some(default), _) => Some(default.clone()),
            (None, ExtractMode::Filled) => Some(Value::Object(nested)),
            (None, ExtractMode::Sparse) => None,
        };
    }

    if !text.is_empty() {
        if let Some(captures) = first_capture(&field.patterns, text, field.kind) {
            return Some(coerce(field.kind, captures));
        }
    }

    match (&field.default, mode) {
        (Some(default), _) => Some(default.clone()),
        (None, ExtractMode::Filled) => Some(zero_value(field.kind)),
        (None, ExtractMode::Sparse) => None,
    }
}

/// Insert `value` at a dotted path, creating intermediate objects. Objects
/// already present at the destination are merged rather than replaced.
pub(crate) fn insert_path(out: &mut Map<String, Value>, path: &str, value: Value) {
    let Some((head, rest)) = path.split_once('.') else {
        merge_into(out, path, value);
        return;
    };

    let slot = out
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(nested) = slot {
        insert_path(nested, rest, value);
    }
}

fn merge_into(map: &mut Map<String, Value>, key: &str, value: Value) {
    match value {
        Value::Object(incoming) => {
            if let Some(Value::Object(existing)) = map.get_mut(key) {
                for (k, v) in incoming {
                    merge_into(existing, &k, v);
                }
            } else {
                map.insert(key.to_string(), Value::Object(incoming));
            }
        }
        value => {
            map.insert(key.to_string(), value);
        }
    }
}
