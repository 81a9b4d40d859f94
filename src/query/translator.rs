//! Client parameters to predicate tree
//!
//! Only fields on the collection's allow-list become predicates, and every
//! token is checked before it is used as a field name, so client strings
//! never reach a storage query unvalidated.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::CollectionConfig;
use crate::core::error::ValidationError;
use crate::query::filter::{Comparator, Condition, Filter, TextPattern};
use crate::query::params::{ParamValue, QueryParams};

/// Reject tokens that are not plain (optionally dotted) identifiers
///
/// Anything starting with `$`, containing brackets, whitespace or other
/// punctuation could be read as storage control syntax.
pub fn check_token(token: &str) -> Result<(), ValidationError> {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
    });

    if regex.is_match(token) {
        Ok(())
    } else {
        Err(ValidationError::ControlSyntax {
            token: token.to_string(),
        })
    }
}

/// Translates [`QueryParams`] into a [`Filter`] for one collection
#[derive(Debug, Clone, Copy)]
pub struct FilterTranslator<'a> {
    collection: &'a CollectionConfig,
}

impl<'a> FilterTranslator<'a> {
    pub fn new(collection: &'a CollectionConfig) -> Self {
        Self { collection }
    }

    /// Build the filter; reserved parameters (`page`, `limit`, `sort`,
    /// `fields`) are skipped
    pub fn translate(&self, params: &QueryParams) -> Result<Filter, ValidationError> {
        let mut filter = Filter::new();

        for (name, value) in params.filters() {
            check_token(name)?;

            match value {
                ParamValue::Single(raw) => {
                    self.require_filterable(name)?;
                    filter.push(name, self.plain_condition(name, raw)?);
                }
                ParamValue::Nested(ops) => {
                    for (token, raw) in ops {
                        match Comparator::from_token(token) {
                            Some(op) => {
                                self.require_filterable(name)?;
                                filter.push(name, Condition::Compare(op, parse_bound(name, token, raw)?));
                            }
                            // Unrecognized operator keys address a field of
                            // that name, subject to the same checks
                            None => {
                                check_token(token)?;
                                self.require_filterable(token)?;
                                tracing::debug!(
                                    parameter = %name,
                                    field = %token,
                                    "nested key is not an operator, treating it as a field"
                                );
                                filter.push(token.as_str(), self.plain_condition(token, raw)?);
                            }
                        }
                    }
                }
            }
        }

        Ok(filter)
    }

    fn plain_condition(&self, field: &str, raw: &str) -> Result<Condition, ValidationError> {
        if self.collection.is_text_search(field) {
            Ok(Condition::Contains(TextPattern::new(field, raw)?))
        } else {
            Ok(Condition::Equals(raw.to_string()))
        }
    }

    fn require_filterable(&self, field: &str) -> Result<(), ValidationError> {
        if self.collection.is_filterable(field) {
            Ok(())
        } else {
            Err(ValidationError::UnknownField {
                field: field.to_string(),
            })
        }
    }
}

fn parse_bound(field: &str, token: &str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| {
            ValidationError::invalid(
                format!("{}[{}]", field, token),
                format!("'{}' is not a number", raw),
            )
        })
}
