//! Raw client query parameters
//!
//! Parameters arrive as strings, optionally nested one level with bracket
//! syntax (`price[gte]=100`). Nothing is validated here; that is the
//! translator's job.

use indexmap::IndexMap;
use serde_json::Value;

use crate::core::error::ValidationError;

/// Parameter names routed to the query plan instead of the filter
pub const RESERVED_PARAMS: [&str; 4] = ["limit", "sort", "page", "fields"];

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `name=value`
    Single(String),
    /// `name[op]=value`, keyed by `op` in arrival order
    Nested(IndexMap<String, String>),
}

impl ParamValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s),
            ParamValue::Nested(_) => None,
        }
    }
}

/// Ordered mapping of parameter name to value
///
/// # Example
/// ```rust,ignore
/// let params = QueryParams::from_query_string("price[gte]=100&title=phone&page=2");
/// assert_eq!(params.single("page"), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: IndexMap<String, ParamValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL query string (without the leading `?`)
    ///
    /// Percent-encoding and `+` are decoded. Keys of the form `name[op]`
    /// become nested values; any other key is taken verbatim. A repeated
    /// key overwrites the earlier value.
    pub fn from_query_string(raw: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
            match split_bracket_key(&key) {
                Some((name, op)) => params.insert_nested(name, op, value.into_owned()),
                None => params.insert(key.into_owned(), value.into_owned()),
            }
        }
        params
    }

    /// Build from a JSON object of strings or one-level objects of strings.
    ///
    /// Numbers and booleans are accepted in their textual form so that a
    /// pre-parsed query (e.g. from a framework extractor) round-trips.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::invalid("query", "expected an object"))?;

        let mut params = Self::new();
        for (name, value) in object {
            match value {
                Value::Object(ops) => {
                    for (op, raw) in ops {
                        let raw = scalar_text(raw).ok_or_else(|| {
                            ValidationError::invalid(
                                format!("{}[{}]", name, op),
                                "nested values must be scalars",
                            )
                        })?;
                        params.insert_nested(name.clone(), op.clone(), raw);
                    }
                }
                other => {
                    let raw = scalar_text(other).ok_or_else(|| {
                        ValidationError::invalid(name.clone(), "expected a scalar or an object")
                    })?;
                    params.insert(name.clone(), raw);
                }
            }
        }
        Ok(params)
    }

    /// Set a plain value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params
            .insert(name.into(), ParamValue::Single(value.into()));
    }

    /// Set one operator entry of a nested value
    pub fn insert_nested(
        &mut self,
        name: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<String>,
    ) {
        let slot = self
            .params
            .entry(name.into())
            .or_insert_with(|| ParamValue::Nested(IndexMap::new()));
        if let ParamValue::Single(_) = slot {
            *slot = ParamValue::Nested(IndexMap::new());
        }
        if let ParamValue::Nested(ops) = slot {
            ops.insert(op.into(), value.into());
        }
    }

    /// Builder form of [`QueryParams::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder form of [`QueryParams::insert_nested`]
    pub fn with_nested(
        mut self,
        name: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.insert_nested(name, op, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Plain value of a parameter, `None` when absent or nested
    pub fn single(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_single)
    }

    /// Parameters that are candidate field filters, in arrival order
    pub fn filters(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params
            .iter()
            .filter(|(name, _)| !RESERVED_PARAMS.contains(&name.as_str()))
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Split `name[op]` into `(name, op)`; anything else yields `None`
fn split_bracket_key(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    let inner = key[open + 1..].strip_suffix(']')?;
    if open == 0 || inner.contains('[') || inner.contains(']') {
        return None;
    }
    Some((&key[..open], inner))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
