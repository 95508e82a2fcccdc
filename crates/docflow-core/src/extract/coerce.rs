//! Conversion of captured text into typed JSON values.

use regex::{Captures, Regex};
use serde_json::{Map, Value, json};

use super::schema::FieldKind;

/// Run the patterns in order and return the first usable match.
///
/// For array fields with several capture groups every participating group
/// is returned; otherwise capture group 1, or the whole match when the
/// pattern has no group.
pub(crate) fn first_capture(patterns: &[Regex], text: &str, kind: FieldKind) -> Option<Vec<String>> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|caps| captured(re, &caps, kind)))
}

fn captured(re: &Regex, caps: &Captures<'_>, kind: FieldKind) -> Option<Vec<String>> {
    let groups = re.captures_len() - 1;
    if groups == 0 {
        return caps.get(0).map(|m| vec![m.as_str().to_string()]);
    }
    if kind == FieldKind::Array && groups > 1 {
        let parts: Vec<String> = (1..=groups)
            .filter_map(|i| caps.get(i))
            .map(|m| m.as_str().to_string())
            .collect();
        return (!parts.is_empty()).then_some(parts);
    }
    caps.get(1).map(|m| vec![m.as_str().to_string()])
}

/// Coerce captured text into the field's declared type.
pub(crate) fn coerce(kind: FieldKind, captures: Vec<String>) -> Value {
    match kind {
        FieldKind::Array => to_array(captures),
        FieldKind::Number => to_number(&joined(captures)),
        FieldKind::Integer => to_integer(&joined(captures)),
        FieldKind::String | FieldKind::Object => Value::String(joined(captures).trim().to_string()),
    }
}

fn joined(captures: Vec<String>) -> String {
    captures.into_iter().next().unwrap_or_default()
}

/// Keep only digits and the decimal point.
fn numeric_chars(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

/// `"$1,234.56"` becomes `1234.56`; unparseable input stays a string.
pub fn to_number(raw: &str) -> Value {
    let cleaned = numeric_chars(raw);
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => json!(n),
        _ => Value::String(cleaned),
    }
}

/// Integer parse with a truncating float fallback.
pub fn to_integer(raw: &str) -> Value {
    let cleaned = numeric_chars(raw);
    if let Ok(n) = cleaned.parse::<i64>() {
        return json!(n);
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => json!(n.trunc() as i64),
        _ => Value::String(cleaned),
    }
}

fn to_array(captures: Vec<String>) -> Value {
    if captures.len() > 1 {
        return Value::Array(
            captures
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        );
    }

    let raw = joined(captures);
    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let items: Vec<&str> = match lines.as_slice() {
        [single] => single.split(',').map(str::trim).filter(|s| !s.is_empty()).collect(),
        _ => lines,
    };
    Value::Array(items.into_iter().map(|s| Value::String(s.to_string())).collect())
}

/// Zero value of a declared type. Objects are filled by the caller.
pub(crate) fn zero_value(kind: FieldKind) -> Value {
    match kind {
        FieldKind::String => Value::String(String::new()),
        FieldKind::Number => json!(0.0),
        FieldKind::Integer => json!(0),
        FieldKind::Array => Value::Array(Vec::new()),
        FieldKind::Object => Value::Object(Map::new()),
    }
}
