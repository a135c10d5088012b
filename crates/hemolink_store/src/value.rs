//! Field values and documents.

use crate::error::{StoreError, StoreResult};
use crate::path::DocumentRef;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field name to value mapping used by writes.
pub type Fields = BTreeMap<String, FieldValue>;

/// A value to be written into a document field.
///
/// Besides literal JSON values the store understands two transforms that are
/// resolved at commit time, inside the store, without the caller reading the
/// document first.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A literal JSON value.
    Value(Value),
    /// Replaced by the store's commit time (RFC 3339, UTC).
    ServerTimestamp,
    /// Appends the given elements to an array field.
    ///
    /// Creates the array when the field is absent or not an array. Existing
    /// elements are never removed, reordered, or deduplicated.
    ArrayAppend(Vec<Value>),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Value(Value::String(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Value(Value::Bool(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Value(Value::from(value))
    }
}

/// Converts a serializable struct into literal fields.
///
/// # Errors
///
/// Returns [`StoreError::InvalidData`] if `value` does not serialize to a
/// JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> StoreResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, FieldValue::Value(v)))
            .collect()),
        other => Err(StoreError::InvalidData(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// A stored document as returned by reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    reference: DocumentRef,
    data: Map<String, Value>,
}

impl Document {
    pub(crate) fn new(reference: DocumentRef, data: Map<String, Value>) -> Self {
        Self { reference, data }
    }

    /// Returns the document's address.
    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    /// Returns the document id.
    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// Returns the raw field data.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns one field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Decodes the document into a typed model.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the data does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}
