//! Stored documents
//!
//! A [`Record`] is an identifier plus an open JSON object. Scalar fields are
//! used for filtering and sorting, array fields hold membership lists and
//! keyed entries. This crate only reads or writes the fields it is told about.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::error::StorageError;

/// Name under which the identifier appears in projections and sort keys
pub const ID_FIELD: &str = "id";

/// Internal versioning field, hidden from default projections
pub const VERSION_FIELD: &str = "__v";

/// A single stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create an empty record with the given identifier
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Build a record from a JSON object, assigning a fresh id when none is present
    pub fn from_json(value: Value) -> Result<Self, StorageError> {
        let Value::Object(mut fields) = value else {
            return Err(StorageError::integrity("record must be a JSON object"));
        };

        let id = match fields.remove(ID_FIELD) {
            Some(Value::String(s)) => Uuid::parse_str(&s)
                .map_err(|e| StorageError::integrity(format!("invalid record id '{}': {}", s, e)))?,
            Some(other) => {
                return Err(StorageError::integrity(format!(
                    "record id must be a string, got {}",
                    other
                )));
            }
            None => Uuid::new_v4(),
        };

        Ok(Self { id, fields })
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Read a field by name or dotted path (`specs.weight`).
    ///
    /// The identifier is not part of `fields`; use [`Record::value_of`] when
    /// `id` must resolve too.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Read a field, resolving `id` to its string form
    pub fn value_of(&self, path: &str) -> Option<Value> {
        if path == ID_FIELD {
            return Some(Value::String(self.id.to_string()));
        }
        self.get(path).cloned()
    }

    /// Borrow a list field; a missing field reads as empty
    pub fn list(&self, field: &str) -> Result<&[Value], StorageError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(StorageError::integrity(format!(
                "field '{}' is not a list: {}",
                field, other
            ))),
        }
    }

    /// Mutably borrow a list field, creating it when absent
    pub fn list_mut(&mut self, field: &str) -> Result<&mut Vec<Value>, StorageError> {
        let slot = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        match slot {
            Value::Array(items) => Ok(items),
            other => Err(StorageError::integrity(format!(
                "field '{}' is not a list: {}",
                field, other
            ))),
        }
    }

    /// Current internal version, zero when never written
    pub fn version(&self) -> u64 {
        self.fields
            .get(VERSION_FIELD)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}
