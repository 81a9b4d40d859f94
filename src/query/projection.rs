//! Field projection

use serde_json::Map;

use crate::core::error::ValidationError;
use crate::core::record::{ID_FIELD, Record};
use crate::query::translator::check_token;

/// Which fields a listing returns
///
/// The identifier is always returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Every field except the hidden internal one
    Default { hidden: String },
    /// Only these fields
    Include(Vec<String>),
    /// Every field except these and the hidden internal one
    Exclude { fields: Vec<String>, hidden: String },
}

impl Projection {
    /// Parse the `fields` parameter: `title,price` includes, `-description`
    /// excludes; the two forms cannot be mixed
    pub fn parse(raw: Option<&str>, hidden: &str) -> Result<Self, ValidationError> {
        let Some(raw) = raw else {
            return Ok(Projection::Default {
                hidden: hidden.to_string(),
            });
        };

        let mut included = Vec::new();
        let mut excluded = Vec::new();
        // `id` alone still selects the include form
        let mut include_seen = false;
        for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (field, bucket) = match segment.strip_prefix('-') {
                Some(field) => (field, &mut excluded),
                None => {
                    include_seen = true;
                    (segment, &mut included)
                }
            };
            check_token(field)?;
            if field.contains('.') {
                return Err(ValidationError::invalid(
                    "fields",
                    format!("nested projection '{}' is not supported", field),
                ));
            }
            if field == ID_FIELD {
                if segment.starts_with('-') {
                    return Err(ValidationError::invalid(
                        "fields",
                        "the identifier cannot be excluded",
                    ));
                }
                continue;
            }
            if !bucket.iter().any(|f| f == field) {
                bucket.push(field.to_string());
            }
        }

        match (include_seen, excluded.is_empty()) {
            (true, false) => Err(ValidationError::MixedProjection),
            (true, true) => Ok(Projection::Include(included)),
            (false, false) => Ok(Projection::Exclude {
                fields: excluded,
                hidden: hidden.to_string(),
            }),
            (false, true) => Ok(Projection::Default {
                hidden: hidden.to_string(),
            }),
        }
    }

    /// Shape a record for output
    pub fn apply(&self, mut record: Record) -> Record {
        match self {
            Projection::Default { hidden } => {
                record.fields.remove(hidden);
            }
            Projection::Include(fields) => {
                let mut kept = Map::new();
                for field in fields {
                    if let Some(value) = record.fields.remove(field) {
                        kept.insert(field.clone(), value);
                    }
                }
                record.fields = kept;
            }
            Projection::Exclude { fields, hidden } => {
                record.fields.remove(hidden);
                for field in fields {
                    record.fields.remove(field);
                }
            }
        }
        record
    }
}
