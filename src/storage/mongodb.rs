//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides `MongoRecordStore`, a [`RecordStore`] over one collection of a
//! `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! catalog-core = { version = "0.1.0", features = ["mongodb_backend"] }
//! ```
//!
//! # Rendering
//!
//! Filters, sort specs, projections and patches are rendered into native
//! query documents here and nowhere else:
//!
//! | Structure | Document |
//! |-----------|----------|
//! | `Compare(Gte, 10)` | `{ price: { $gte: 10 } }` |
//! | `Contains("phone")` | `{ title: { $regex: "phone", $options: "i" } }` |
//! | `Equals("25")` | `{ quantity: { $in: ["25", 25] } }` |
//! | `ElementMatch` | `{ ratings: { $elemMatch: { postedBy: ... } } }` |
//! | `SetMatched` | `{ $set: { "ratings.$.star": 4 } }` |
//!
//! The `id` field is mapped to MongoDB's `_id` convention and stored as a
//! UUID string.

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use serde_json::Value;
use uuid::Uuid;

use crate::core::error::StorageError;
use crate::core::record::{ID_FIELD, Record, VERSION_FIELD};
use crate::query::filter::{Condition, FieldPredicate, Filter};
use crate::query::projection::Projection;
use crate::query::sort::{SortDirection, SortSpec};
use crate::storage::{FieldUpdate, Patch, RecordStore};

const BACKEND: &str = "mongodb";

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn to_bson(value: &Value) -> Result<Bson, StorageError> {
    mongodb::bson::to_bson(value).map_err(|e| StorageError::query(BACKEND, e))
}

/// Convert a record into a BSON Document, renaming `id` → `_id`.
fn record_to_document(record: &Record) -> Result<Document, StorageError> {
    let json = serde_json::to_value(record)?;
    let mut doc = match to_bson(&json)? {
        Bson::Document(d) => d,
        _ => return Err(StorageError::query(BACKEND, "expected a BSON document")),
    };

    if let Some(id) = doc.remove(ID_FIELD) {
        doc.insert("_id", id);
    }
    Ok(doc)
}

/// Convert a BSON Document back into a record, renaming `_id` → `id`.
fn document_to_record(mut doc: Document) -> Result<Record, StorageError> {
    if let Some(id) = doc.remove("_id") {
        doc.insert(ID_FIELD, id);
    }
    Record::from_json(Bson::Document(doc).into_relaxed_extjson())
}

/// Field name as stored
fn storage_field(field: &str) -> &str {
    if field == ID_FIELD { "_id" } else { field }
}

/// The raw literal plus its native readings, so `"25"` matches a stored
/// string `"25"` as well as the integer `25`.
fn literal_variants(raw: &str) -> Vec<Bson> {
    let mut variants = vec![Bson::String(raw.to_string())];

    match raw {
        "true" => variants.push(Bson::Boolean(true)),
        "false" => variants.push(Bson::Boolean(false)),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                variants.push(Bson::Int64(i));
            }
            if let Ok(f) = raw.parse::<f64>()
                && f.is_finite()
            {
                variants.push(Bson::Double(f));
            }
        }
    }
    variants
}

fn render_predicate(predicate: &FieldPredicate) -> Result<Document, StorageError> {
    let field = storage_field(&predicate.field);

    let rendered = match &predicate.condition {
        Condition::Equals(raw) if field == "_id" => doc! { field: raw.as_str() },
        Condition::Equals(raw) => {
            let mut variants = literal_variants(raw);
            if variants.len() == 1 {
                doc! { field: variants.remove(0) }
            } else {
                doc! { field: { "$in": variants } }
            }
        }
        Condition::Compare(op, bound) => doc! { field: { op.storage_token(): *bound } },
        Condition::Contains(pattern) => doc! {
            field: { "$regex": pattern.escaped(), "$options": "i" }
        },
        Condition::ElementMatch(criteria) => {
            let criteria = to_bson(&Value::Object(criteria.clone()))?;
            doc! { field: { "$elemMatch": criteria } }
        }
    };
    Ok(rendered)
}

/// Render a conjunction; predicates on the same field stay separate
/// clauses under `$and`
pub fn render_filter(filter: &Filter) -> Result<Document, StorageError> {
    let mut clauses = filter
        .predicates()
        .iter()
        .map(render_predicate)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match clauses.len() {
        0 => Document::new(),
        1 => clauses.remove(0),
        _ => doc! { "$and": clauses },
    })
}

pub fn render_sort(sort: &SortSpec) -> Document {
    let mut rendered = Document::new();
    for key in sort.keys() {
        let direction = match key.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };
        rendered.insert(storage_field(&key.field), direction);
    }
    // Ties on the client keys must page the same way on every query
    if !rendered.is_empty() && !rendered.contains_key("_id") {
        rendered.insert("_id", 1);
    }
    rendered
}

pub fn render_projection(projection: &Projection) -> Document {
    let mut rendered = Document::new();
    match projection {
        Projection::Default { hidden } => {
            rendered.insert(hidden.as_str(), 0);
        }
        Projection::Include(fields) if fields.is_empty() => {
            rendered.insert("_id", 1);
        }
        Projection::Include(fields) => {
            for field in fields {
                rendered.insert(field.as_str(), 1);
            }
        }
        Projection::Exclude { fields, hidden } => {
            for field in fields {
                rendered.insert(field.as_str(), 0);
            }
            rendered.insert(hidden.as_str(), 0);
        }
    }
    rendered
}

/// Render a patch as one update document; every write bumps `__v` and
/// stamps `updatedAt`
pub fn render_patch(patch: &Patch) -> Result<Document, StorageError> {
    let mut set = Document::new();
    let mut push = Document::new();
    let mut pull = Document::new();

    for update in patch.updates() {
        let target = update.target();
        if target == ID_FIELD || target == VERSION_FIELD {
            return Err(StorageError::integrity(format!(
                "field '{}' cannot be patched",
                target
            )));
        }
        match update {
            FieldUpdate::Set { field, value } => {
                set.insert(field.as_str(), to_bson(value)?);
            }
            FieldUpdate::Push { field, value } => {
                push.insert(field.as_str(), to_bson(value)?);
            }
            FieldUpdate::Pull { field, value } => {
                pull.insert(field.as_str(), to_bson(value)?);
            }
            FieldUpdate::SetMatched { list, fields } => {
                for (key, value) in fields {
                    set.insert(format!("{}.$.{}", list, key), to_bson(value)?);
                }
            }
        }
    }

    set.insert("updatedAt", Utc::now().to_rfc3339());

    let mut rendered = doc! { "$set": set, "$inc": { VERSION_FIELD: 1 } };
    if !push.is_empty() {
        rendered.insert("$push", push);
    }
    if !pull.is_empty() {
        rendered.insert("$pull", pull);
    }
    Ok(rendered)
}

// ---------------------------------------------------------------------------
// MongoRecordStore
// ---------------------------------------------------------------------------

/// Record storage backed by one MongoDB collection.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use catalog::storage::MongoRecordStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoRecordStore::new(client.database("shop"), "products");
/// ```
#[derive(Clone, Debug)]
pub struct MongoRecordStore {
    database: Database,
    collection_name: String,
}

impl MongoRecordStore {
    pub fn new(database: Database, collection_name: impl Into<String>) -> Self {
        Self {
            database,
            collection_name: collection_name.into(),
        }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self) -> Collection<Document> {
        self.database.collection(&self.collection_name)
    }

    async fn update_returning(
        &self,
        filter: Document,
        patch: &Patch,
    ) -> Result<Option<Record>, StorageError> {
        let update = render_patch(patch)?;

        let updated = self
            .collection()
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;

        updated.map(document_to_record).transpose()
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn find(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        projection: &Projection,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Record>, StorageError> {
        let query = render_filter(filter)?;
        tracing::debug!(collection = %self.collection_name, filter = %query, skip, limit, "mongodb find");

        let collection = self.collection();
        let mut action = collection
            .find(query)
            .projection(render_projection(projection))
            .skip(skip as u64)
            .limit(limit as i64);
        if !sort.is_natural() {
            action = action.sort(render_sort(sort));
        }

        let docs: Vec<Document> = action
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?
            .try_collect()
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;

        docs.into_iter().map(document_to_record).collect()
    }

    async fn count_matching(&self, filter: &Filter) -> Result<u64, StorageError> {
        self.collection()
            .count_documents(render_filter(filter)?)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Record>, StorageError> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;

        doc.map(document_to_record).transpose()
    }

    async fn update_by_id(&self, id: &Uuid, patch: &Patch) -> Result<Option<Record>, StorageError> {
        self.update_returning(doc! { "_id": id.to_string() }, patch)
            .await
    }

    async fn update_one_matching(
        &self,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<Option<Record>, StorageError> {
        self.update_returning(render_filter(filter)?, patch).await
    }

    /// Inserts the document and reads it back to return the stored version.
    async fn insert(&self, mut record: Record) -> Result<Record, StorageError> {
        let now = Utc::now().to_rfc3339();
        record.set(VERSION_FIELD, 0);
        if record.get("createdAt").is_none() {
            record.set("createdAt", now.clone());
        }
        record.set("updatedAt", now);

        self.collection()
            .insert_one(record_to_document(&record)?)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;

        self.find_by_id(&record.id)
            .await?
            .ok_or_else(|| StorageError::integrity(format!("record '{}' missing after insert", record.id)))
    }
}
