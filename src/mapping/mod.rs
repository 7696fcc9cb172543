//! Defensive translation between loosely-typed upstream documents and typed
//! records.
//!
//! Decoding is total: a field that is missing, or present with the wrong
//! kind, falls back to its default and never aborts the rest of the record.
//! The only decode failure is a body that is not a JSON object at all.

pub mod driver;
pub mod response;

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::AppError;

/// String-keyed document exchanged with the upstream backend.
pub type Document = Map<String, Value>;

/// Reported in place of an exact `0.0` distance. Proto3 drops zero-valued
/// fields, which would make "at the query point" look like "no distance".
pub const ZERO_DISTANCE_SENTINEL_KM: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    Boolean,
    Document,
    List,
}

/// A value that can be pulled out of, and written into, a document field.
pub trait FieldValue: Sized {
    const KIND: FieldKind;

    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl FieldValue for f64 {
    const KIND: FieldKind = FieldKind::Number;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn into_value(self) -> Value {
        Number::from_f64(self).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl FieldValue for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    // Doubles are truncated toward zero.
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|raw| raw.is_finite())
                .map(|raw| raw.trunc() as i64)
        })
    }

    fn into_value(self) -> Value {
        Value::Number(self.into())
    }
}

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Boolean;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FieldValue for Document {
    const KIND: FieldKind = FieldKind::Document;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }

    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl FieldValue for Vec<Document> {
    const KIND: FieldKind = FieldKind::List;

    /// Non-object elements are dropped, the rest are kept.
    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_object).cloned().collect())
    }

    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(Value::Object).collect())
    }
}

/// Parses a response body into a document. Anything that is not a JSON
/// object is `UpstreamMalformedResponse`.
pub fn parse_document(body: &[u8]) -> Result<Document, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| AppError::UpstreamMalformedResponse(format!("invalid json: {err}")))?;

    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(AppError::UpstreamMalformedResponse(format!(
            "expected a json object, got {}",
            kind_name(&other)
        ))),
    }
}

/// Reads `name` as `T`, keeping `default` when the field is absent or of
/// another kind.
pub fn field<T: FieldValue>(doc: &Document, name: &str, default: T) -> T {
    optional_field(doc, name).unwrap_or(default)
}

pub fn optional_field<T: FieldValue>(doc: &Document, name: &str) -> Option<T> {
    let value = doc.get(name)?;
    if value.is_null() {
        return None;
    }

    let decoded = T::from_value(value);
    if decoded.is_none() {
        debug!(
            field = name,
            expected = ?T::KIND,
            found = kind_name(value),
            "skipping field with unexpected kind"
        );
    }
    decoded
}

pub fn wire_distance(distance_km: f64) -> f64 {
    if distance_km == 0.0 {
        ZERO_DISTANCE_SENTINEL_KM
    } else {
        distance_km
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds an outbound document field by field.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    doc: Document,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<T: FieldValue>(mut self, name: &str, value: T) -> Self {
        self.doc.insert(name.to_string(), value.into_value());
        self
    }

    /// Absent values are written as `null` so the key set stays fixed.
    pub fn optional<T: FieldValue>(mut self, name: &str, value: Option<T>) -> Self {
        let value = value.map(FieldValue::into_value).unwrap_or(Value::Null);
        self.doc.insert(name.to_string(), value);
        self
    }

    pub fn distance(self, name: &str, distance_km: f64) -> Self {
        self.field(name, wire_distance(distance_km))
    }

    pub fn build(self) -> Document {
        self.doc
    }
}
