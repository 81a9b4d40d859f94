//! Single-record updates
//!
//! A [`Patch`] is the write half of the storage contract. Backends apply all
//! of a patch's updates to one record or none of them.

use serde_json::{Map, Value};

use crate::core::error::StorageError;
use crate::core::record::{ID_FIELD, Record, VERSION_FIELD};
use crate::query::filter::{Filter, element_matches};

/// One field-level edit
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace a top-level field
    Set { field: String, value: Value },
    /// Append to a list field, creating it when absent
    Push { field: String, value: Value },
    /// Remove every occurrence of a value from a list field
    Pull { field: String, value: Value },
    /// Overwrite fields of the list element selected by the match filter's
    /// element-match predicate on `list`
    SetMatched {
        list: String,
        fields: Map<String, Value>,
    },
}

impl FieldUpdate {
    /// Field the update writes to
    pub fn target(&self) -> &str {
        match self {
            FieldUpdate::Set { field, .. }
            | FieldUpdate::Push { field, .. }
            | FieldUpdate::Pull { field, .. } => field,
            FieldUpdate::SetMatched { list, .. } => list,
        }
    }
}

/// Ordered set of updates against one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    updates: Vec<FieldUpdate>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(FieldUpdate::Set {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn push(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(FieldUpdate::Push {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn pull(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(FieldUpdate::Pull {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn set_matched(list: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self::new().and(FieldUpdate::SetMatched {
            list: list.into(),
            fields,
        })
    }

    /// Add an update, builder style
    pub fn and(mut self, update: FieldUpdate) -> Self {
        self.updates.push(update);
        self
    }

    pub fn updates(&self) -> &[FieldUpdate] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Apply every update to `record` in place
    ///
    /// `matched_by` supplies the element-match predicates that
    /// [`FieldUpdate::SetMatched`] resolves against. On error the record may
    /// be partially modified; callers apply to a copy.
    pub fn apply_to(&self, record: &mut Record, matched_by: Option<&Filter>) -> Result<(), StorageError> {
        for update in &self.updates {
            match update {
                FieldUpdate::Set { field, value } => {
                    guard_field(field)?;
                    record.set(field.clone(), value.clone());
                }
                FieldUpdate::Push { field, value } => {
                    guard_field(field)?;
                    record.list_mut(field)?.push(value.clone());
                }
                FieldUpdate::Pull { field, value } => {
                    guard_field(field)?;
                    if record.get(field).is_some() {
                        record.list_mut(field)?.retain(|item| item != value);
                    }
                }
                FieldUpdate::SetMatched { list, fields } => {
                    guard_field(list)?;
                    let criteria = matched_by
                        .and_then(|filter| filter.element_match(list))
                        .ok_or_else(|| {
                            StorageError::integrity(format!(
                                "positional update on '{}' without an element match",
                                list
                            ))
                        })?;
                    let entry = record
                        .list_mut(list)?
                        .iter_mut()
                        .find(|item| element_matches(item, criteria))
                        .and_then(Value::as_object_mut)
                        .ok_or_else(|| {
                            StorageError::integrity(format!("no element of '{}' matched", list))
                        })?;
                    for (key, value) in fields {
                        entry.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }
}

/// The identifier and version are owned by the store
fn guard_field(field: &str) -> Result<(), StorageError> {
    if field == ID_FIELD || field == VERSION_FIELD {
        return Err(StorageError::integrity(format!(
            "field '{}' cannot be patched",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::Condition;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_push_and_pull() {
        let mut record = Record::new(Uuid::new_v4());
        Patch::push("likes", "a").apply_to(&mut record, None).unwrap();
        Patch::push("likes", "b").apply_to(&mut record, None).unwrap();
        Patch::pull("likes", "a").apply_to(&mut record, None).unwrap();
        assert_eq!(record.get("likes"), Some(&json!(["b"])));
    }

    #[test]
    fn test_pull_on_missing_list_is_noop() {
        let mut record = Record::new(Uuid::new_v4());
        Patch::pull("likes", "a").apply_to(&mut record, None).unwrap();
        assert!(record.get("likes").is_none());
    }

    #[test]
    fn test_set_matched_updates_only_given_fields() {
        let mut record = Record::new(Uuid::new_v4()).with(
            "ratings",
            json!([
                { "postedBy": "u1", "star": 3, "comment": "ok" },
                { "postedBy": "u2", "star": 5, "comment": "great" }
            ]),
        );
        let mut criteria = Map::new();
        criteria.insert("postedBy".into(), json!("u1"));
        let filter = Filter::by_id(record.id).and("ratings", Condition::ElementMatch(criteria));

        let mut fields = Map::new();
        fields.insert("star".into(), json!(1));
        Patch::set_matched("ratings", fields)
            .apply_to(&mut record, Some(&filter))
            .unwrap();

        assert_eq!(
            record.get("ratings"),
            Some(&json!([
                { "postedBy": "u1", "star": 1, "comment": "ok" },
                { "postedBy": "u2", "star": 5, "comment": "great" }
            ]))
        );
    }

    #[test]
    fn test_set_matched_requires_element_match() {
        let mut record = Record::new(Uuid::new_v4()).with("ratings", json!([]));
        let err = Patch::set_matched("ratings", Map::new())
            .apply_to(&mut record, None)
            .unwrap_err();
        assert!(matches!(err, StorageError::IntegrityError { .. }));
    }

    #[test]
    fn test_reserved_fields_cannot_be_patched() {
        let mut record = Record::new(Uuid::new_v4());
        assert!(Patch::set("__v", 9).apply_to(&mut record, None).is_err());
        assert!(Patch::set("id", "x").apply_to(&mut record, None).is_err());
    }
}
