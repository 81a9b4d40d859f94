//! Multi-key sort order

use serde_json::Value;
use std::cmp::Ordering;

use crate::config::CollectionConfig;
use crate::core::error::ValidationError;
use crate::core::record::Record;
use crate::query::translator::check_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Ordered sort keys, leftmost primary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// No explicit order; the storage layer's natural order applies
    pub fn natural() -> Self {
        Self::default()
    }

    /// Parse `price,-title`: comma separated, `-` prefix for descending
    ///
    /// Empty segments are skipped and a repeated field keeps its first
    /// position.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let mut keys: Vec<SortKey> = Vec::new();

        for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (field, direction) = match segment.strip_prefix('-') {
                Some(field) => (field, SortDirection::Desc),
                None => (segment, SortDirection::Asc),
            };
            check_token(field)?;

            if keys.iter().any(|k| k.field == field) {
                continue;
            }
            keys.push(SortKey {
                field: field.to_string(),
                direction,
            });
        }

        Ok(Self { keys })
    }

    /// Reject keys that are not sortable in `collection`
    pub fn ensure_allowed(&self, collection: &CollectionConfig) -> Result<(), ValidationError> {
        match self.keys.iter().find(|k| !collection.is_sortable(&k.field)) {
            Some(key) => Err(ValidationError::UnknownSortField {
                field: key.field.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_natural(&self) -> bool {
        self.keys.is_empty()
    }

    /// Ordering of two records under these keys
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.keys {
            let ordering = compare_values(
                a.value_of(&key.field).as_ref(),
                b.value_of(&key.field).as_ref(),
            );
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort: records equal under every key keep their relative order
    pub fn sort(&self, records: &mut [Record]) {
        if !self.is_natural() {
            records.sort_by(|a, b| self.compare(a, b));
        }
    }
}

/// Cross-type ordering: missing/null, numbers, strings, objects, lists, booleans
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ordering = compare_values(Some(l), Some(r));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
