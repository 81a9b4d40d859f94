//! Predicate tree handed to the storage layer
//!
//! A [`Filter`] is a conjunction of per-field predicates. Every backend
//! receives the same structure; [`Filter::matches`] is the reference
//! evaluation used by the in-memory store.

use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::core::error::ValidationError;
use crate::core::record::{ID_FIELD, Record};

/// Comparison operators accepted in nested filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    pub const ALL: [Comparator; 4] = [
        Comparator::Gte,
        Comparator::Gt,
        Comparator::Lte,
        Comparator::Lt,
    ];

    /// Match a client token; case-sensitive, whole token only
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token() == token)
    }

    /// The client-facing token (`gte`)
    pub fn token(&self) -> &'static str {
        match self {
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
        }
    }

    /// The storage layer's operator syntax (`$gte`)
    pub fn storage_token(&self) -> &'static str {
        match self {
            Comparator::Gt => "$gt",
            Comparator::Gte => "$gte",
            Comparator::Lt => "$lt",
            Comparator::Lte => "$lte",
        }
    }

    /// Whether `stored.cmp(bound)` satisfies this operator
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Gte => ordering != Ordering::Less,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Lte => ordering != Ordering::Greater,
        }
    }
}

/// Case-insensitive substring pattern
///
/// The client text is escaped, so it always matches literally.
#[derive(Debug, Clone)]
pub struct TextPattern {
    needle: String,
    regex: Regex,
}

impl TextPattern {
    pub fn new(field: &str, needle: &str) -> Result<Self, ValidationError> {
        let regex = Regex::new(&format!("(?i){}", regex::escape(needle)))
            .map_err(|e| ValidationError::invalid(field, e.to_string()))?;
        Ok(Self {
            needle: needle.to_string(),
            regex,
        })
    }

    /// The text as supplied by the client
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Escaped pattern for backends with native regex support
    pub fn escaped(&self) -> String {
        regex::escape(&self.needle)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.needle == other.needle
    }
}

/// What a single field must satisfy
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Equality against the raw client literal; a stored number or boolean
    /// matches its textual form
    Equals(String),
    /// Numeric comparison
    Compare(Comparator, f64),
    /// Case-insensitive substring match
    Contains(TextPattern),
    /// Some element of a list field carries all of these key/value pairs
    ElementMatch(Map<String, Value>),
}

/// One field constrained by one condition
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub field: String,
    pub condition: Condition,
}

impl FieldPredicate {
    pub fn matches(&self, record: &Record) -> bool {
        let Some(stored) = record.value_of(&self.field) else {
            return false;
        };
        condition_holds(&self.condition, &stored)
    }
}

/// Conjunction of field predicates; empty matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<FieldPredicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a single record by identifier
    pub fn by_id(id: Uuid) -> Self {
        Self::new().and(ID_FIELD, Condition::Equals(id.to_string()))
    }

    /// Add a predicate, builder style
    pub fn and(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.push(field, condition);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, condition: Condition) {
        self.predicates.push(FieldPredicate {
            field: field.into(),
            condition,
        });
    }

    pub fn predicates(&self) -> &[FieldPredicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// The first element-match predicate on `list`, used to resolve
    /// positional updates
    pub fn element_match(&self, list: &str) -> Option<&Map<String, Value>> {
        self.predicates.iter().find_map(|p| match &p.condition {
            Condition::ElementMatch(criteria) if p.field == list => Some(criteria),
            _ => None,
        })
    }
}

fn condition_holds(condition: &Condition, stored: &Value) -> bool {
    // A list field satisfies a scalar condition when any element does
    if let Value::Array(items) = stored {
        if !matches!(condition, Condition::ElementMatch(_)) {
            return items.iter().any(|item| condition_holds(condition, item));
        }
    }

    match condition {
        Condition::Equals(raw) => equals_literal(stored, raw),
        Condition::Compare(op, bound) => stored
            .as_f64()
            .and_then(|n| n.partial_cmp(bound))
            .is_some_and(|ordering| op.holds(ordering)),
        Condition::Contains(pattern) => stored.as_str().is_some_and(|s| pattern.is_match(s)),
        Condition::ElementMatch(criteria) => stored
            .as_array()
            .is_some_and(|items| items.iter().any(|item| element_matches(item, criteria))),
    }
}

/// Whether a list element carries every key/value pair in `criteria`
pub fn element_matches(item: &Value, criteria: &Map<String, Value>) -> bool {
    let Some(entry) = item.as_object() else {
        return false;
    };
    criteria
        .iter()
        .all(|(key, expected)| entry.get(key) == Some(expected))
}

/// Compare a stored value with a raw client literal
///
/// Mirrors the storage search that matches either the string or its
/// native reading (`"25"` matches both `"25"` and `25`).
pub fn equals_literal(stored: &Value, raw: &str) -> bool {
    match stored {
        Value::String(s) => s == raw,
        Value::Number(n) => match (n.as_f64(), raw.trim().parse::<f64>()) {
            (Some(stored), Ok(parsed)) => stored == parsed,
            _ => false,
        },
        Value::Bool(b) => raw.parse::<bool>().is_ok_and(|parsed| parsed == *b),
        _ => false,
    }
}
