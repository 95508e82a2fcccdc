//! Rule-based field extraction.
//!
//! A [`Schema`] lists the fields to pull out of a document's text. Each field
//! carries regex patterns tried in priority order, a declared type the
//! captured text is coerced into, and an optional default. Extraction never
//! fails: unmatched fields are omitted, or zero-filled in
//! [`ExtractMode::Filled`].

mod coerce;
mod engine;
mod registry;
mod schema;

pub use coerce::{to_integer, to_number};
pub use engine::{ExtractMode, extract};
pub use registry::SchemaRegistry;
pub use schema::{CompiledSchema, FieldKind, FieldSpec, Schema, SkippedPattern};
