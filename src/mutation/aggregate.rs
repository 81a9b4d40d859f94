//! Derived aggregates over list fields

use serde_json::Value;

use crate::core::error::StorageError;
use crate::core::record::Record;
use crate::storage::Patch;

/// Recomputes a stored mean from the elements of a list field
///
/// The mean is rounded half away from zero to one decimal place; an empty
/// list yields `0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRecomputation {
    pub list_field: String,
    pub value_field: String,
    pub target_field: String,
}

impl AggregateRecomputation {
    pub fn new(
        list_field: impl Into<String>,
        value_field: impl Into<String>,
        target_field: impl Into<String>,
    ) -> Self {
        Self {
            list_field: list_field.into(),
            value_field: value_field.into(),
            target_field: target_field.into(),
        }
    }

    /// `totalRatings` from `ratings[].star`
    pub fn ratings() -> Self {
        Self::new("ratings", "star", "totalRatings")
    }

    /// Rounded mean of the list's values
    pub fn compute(&self, record: &Record) -> Result<f64, StorageError> {
        let entries = record.list(&self.list_field)?;
        if entries.is_empty() {
            return Ok(0.0);
        }

        let mut sum = 0.0;
        for entry in entries {
            sum += self.read_value(entry)?;
        }

        Ok(round_one_decimal(sum / entries.len() as f64))
    }

    /// Patch that writes the recomputed value
    pub fn patch(&self, record: &Record) -> Result<Patch, StorageError> {
        let value = self.compute(record)?;
        Ok(Patch::set(self.target_field.clone(), value))
    }

    /// Recompute on a detached record
    pub fn recompute(&self, record: &Record) -> Result<Record, StorageError> {
        let mut next = record.clone();
        self.patch(record)?.apply_to(&mut next, None)?;
        Ok(next)
    }

    fn read_value(&self, entry: &Value) -> Result<f64, StorageError> {
        let value = entry.get(&self.value_field);
        let number = match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.ok_or_else(|| {
            StorageError::integrity(format!(
                "'{}' entry has non-numeric '{}': {}",
                self.list_field,
                self.value_field,
                value.map(Value::to_string).unwrap_or_else(|| "missing".into())
            ))
        })
    }
}

/// One decimal place, halves away from zero
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
