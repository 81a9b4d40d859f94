//! Keyed list fields: update an entry in place or append a new one
//!
//! An entry is addressed by the values of the list's key fields. A partial
//! key match (same product, different colour) is *not* a match, so it
//! produces a second entry rather than editing the first.

use serde_json::{Map, Value};

use crate::core::error::{CatalogError, ValidationError};
use crate::core::record::Record;
use crate::query::filter::{Condition, Filter, element_matches};
use crate::storage::Patch;

/// Values of a list's key fields, identifying one entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryKey {
    parts: Map<String, Value>,
}

impl EntryKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key with a single field
    pub fn single(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with(field, value)
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parts.insert(field.into(), value.into());
        self
    }

    /// Whether a stored entry carries exactly these key values
    pub fn matches(&self, entry: &Value) -> bool {
        element_matches(entry, &self.parts)
    }

    pub fn parts(&self) -> &Map<String, Value> {
        &self.parts
    }
}

/// What an upsert will do
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// Entry at `index` gets the supplied payload fields
    Updated { index: usize },
    /// A new entry is appended
    Appended,
}

/// A planned upsert: the outcome, the patch, and for updates the filter
/// that selects the entry positionally
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertPlan {
    pub outcome: UpsertOutcome,
    pub patch: Patch,
    pub matcher: Option<Filter>,
}

/// A list field whose entries are unique by key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedUpsertList {
    pub list_field: String,
    pub key_fields: Vec<String>,
}

impl KeyedUpsertList {
    pub fn new<I, S>(list_field: impl Into<String>, key_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            list_field: list_field.into(),
            key_fields: key_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Cart line items, keyed by product and colour
    pub fn cart() -> Self {
        Self::new("cart", ["product", "color"])
    }

    /// Rating entries, keyed by poster
    pub fn ratings() -> Self {
        Self::new("ratings", ["postedBy"])
    }

    /// Check that `key` names exactly the key fields and `payload` none of them
    pub fn validate(&self, key: &EntryKey, payload: &Map<String, Value>) -> Result<(), ValidationError> {
        for field in &self.key_fields {
            match key.parts.get(field) {
                None | Some(Value::Null) => return Err(ValidationError::missing(field.clone())),
                Some(_) => {}
            }
        }
        if let Some(extra) = key.parts.keys().find(|k| !self.key_fields.contains(k)) {
            return Err(ValidationError::invalid(
                extra.clone(),
                format!("not a key field of '{}'", self.list_field),
            ));
        }
        if let Some(clash) = payload.keys().find(|k| self.key_fields.contains(k)) {
            return Err(ValidationError::invalid(
                clash.clone(),
                "key fields cannot be part of the payload",
            ));
        }
        Ok(())
    }

    /// Position of the entry with this key
    pub fn position(&self, record: &Record, key: &EntryKey) -> Result<Option<usize>, CatalogError> {
        Ok(record
            .list(&self.list_field)?
            .iter()
            .position(|entry| key.matches(entry)))
    }

    /// Decide between updating in place and appending
    pub fn plan(
        &self,
        record: &Record,
        key: &EntryKey,
        payload: &Map<String, Value>,
    ) -> Result<UpsertPlan, CatalogError> {
        self.validate(key, payload)?;

        match self.position(record, key)? {
            Some(index) => {
                let matcher = Filter::by_id(record.id).and(
                    self.list_field.clone(),
                    Condition::ElementMatch(key.parts.clone()),
                );
                Ok(UpsertPlan {
                    outcome: UpsertOutcome::Updated { index },
                    patch: Patch::set_matched(self.list_field.clone(), payload.clone()),
                    matcher: Some(matcher),
                })
            }
            None => {
                let mut entry = key.parts.clone();
                entry.extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(UpsertPlan {
                    outcome: UpsertOutcome::Appended,
                    patch: Patch::push(self.list_field.clone(), Value::Object(entry)),
                    matcher: None,
                })
            }
        }
    }

    /// Upsert on a detached record
    pub fn apply(
        &self,
        record: &Record,
        key: &EntryKey,
        payload: &Map<String, Value>,
    ) -> Result<Record, CatalogError> {
        let plan = self.plan(record, key, payload)?;
        let mut next = record.clone();
        plan.patch.apply_to(&mut next, plan.matcher.as_ref())?;
        Ok(next)
    }
}
