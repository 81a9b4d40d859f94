//! Catalog operations over one collection
//!
//! [`CatalogService`] is the entry point callers use: listings go through a
//! compiled [`QueryPlan`], mutations through the strategies in
//! [`crate::mutation`]. Every mutation reads the current record, plans one
//! patch, and submits it as a single storage update.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{CollectionConfig, PagingConfig};
use crate::core::error::{CatalogError, Result, ValidationError};
use crate::core::record::Record;
use crate::mutation::{
    AggregateRecomputation, EntryKey, KeyedUpsertList, Membership, ToggleSet, ToggleSide,
};
use crate::query::{Page, QueryParams, QueryPlan};
use crate::storage::RecordStore;

/// One cart line: a product in a colour, with the desired quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Uuid,
    pub color: String,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product: Uuid, color: impl Into<String>, quantity: u32) -> Self {
        Self {
            product,
            color: color.into(),
            quantity,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.color.trim().is_empty() {
            return Err(ValidationError::missing("color"));
        }
        if self.quantity < 1 {
            return Err(ValidationError::invalid("quantity", "must be at least 1"));
        }
        Ok(())
    }
}

/// A user's rating of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingInput {
    pub posted_by: Uuid,
    pub star: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RatingInput {
    pub fn new(posted_by: Uuid, star: u8) -> Self {
        Self {
            posted_by,
            star,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=5).contains(&self.star) {
            return Err(ValidationError::invalid(
                "star",
                format!("must be between 1 and 5, got {}", self.star),
            ));
        }
        Ok(())
    }

    /// Fields written into the rating entry; an absent comment is left as
    /// stored
    fn payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("star".into(), Value::from(self.star));
        if let Some(comment) = &self.comment {
            payload.insert("comment".into(), Value::from(comment.clone()));
        }
        payload
    }
}

/// Listing and mutation operations for one collection
pub struct CatalogService {
    store: Arc<dyn RecordStore>,
    collection: CollectionConfig,
    paging: PagingConfig,
    toggles: ToggleSet,
    cart: KeyedUpsertList,
    ratings: KeyedUpsertList,
    aggregate: AggregateRecomputation,
}

impl CatalogService {
    pub fn new(store: Arc<dyn RecordStore>, collection: CollectionConfig, paging: PagingConfig) -> Self {
        Self {
            store,
            collection,
            paging,
            toggles: ToggleSet::likes(),
            cart: KeyedUpsertList::cart(),
            ratings: KeyedUpsertList::ratings(),
            aggregate: AggregateRecomputation::ratings(),
        }
    }

    /// Use a different pair of membership lists for [`toggle`](Self::toggle)
    pub fn with_toggle_set(mut self, toggles: ToggleSet) -> Self {
        self.toggles = toggles;
        self
    }

    pub fn collection(&self) -> &CollectionConfig {
        &self.collection
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Filtered, sorted, projected, paginated listing
    #[tracing::instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn list(&self, params: &QueryParams) -> Result<Page> {
        let plan = QueryPlan::compile(params, &self.collection, &self.paging)?;
        plan.execute(self.store.as_ref()).await
    }

    /// Fetch one full record
    pub async fn get(&self, id: Uuid) -> Result<Record> {
        self.store
            .find_by_id(&id)
            .await?
            .ok_or_else(|| CatalogError::not_found(self.collection.name.clone(), id))
    }

    /// Store a new record
    pub async fn insert(&self, record: Record) -> Result<Record> {
        let stored = self.store.insert(record).await?;
        tracing::debug!(collection = %self.collection.name, record_id = %stored.id, "record inserted");
        Ok(stored)
    }

    /// Toggle `actor` on one side of the membership pair
    ///
    /// An actor on the opposite side is only removed from it; a second call
    /// is needed to land on the requested side.
    #[tracing::instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn toggle(&self, id: Uuid, actor: Uuid, side: ToggleSide) -> Result<Record> {
        let record = self.get(id).await?;
        let actor = actor.to_string();
        let transition = self.toggles.plan(&record, &actor, side)?;

        let updated = self
            .store
            .update_by_id(&id, &transition.patch)
            .await?
            .ok_or_else(|| CatalogError::not_found(self.collection.name.clone(), id))?;

        tracing::info!(
            record_id = %id,
            actor = %actor,
            from = ?transition.from,
            to = ?transition.to,
            "membership toggled"
        );
        Ok(updated)
    }

    /// Current membership of `actor`
    pub async fn membership(&self, id: Uuid, actor: Uuid) -> Result<Membership> {
        let record = self.get(id).await?;
        Ok(self.toggles.membership(&record, &actor.to_string())?)
    }

    /// Update the entry of `list` with this key, or append one
    #[tracing::instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn upsert_entry(
        &self,
        id: Uuid,
        list: &KeyedUpsertList,
        key: EntryKey,
        payload: Map<String, Value>,
    ) -> Result<Record> {
        let record = self.get(id).await?;
        let plan = list.plan(&record, &key, &payload)?;

        let updated = match &plan.matcher {
            Some(matcher) => self.store.update_one_matching(matcher, &plan.patch).await?,
            None => self.store.update_by_id(&id, &plan.patch).await?,
        };
        let updated =
            updated.ok_or_else(|| CatalogError::not_found(self.collection.name.clone(), id))?;

        tracing::info!(
            record_id = %id,
            list = %list.list_field,
            outcome = ?plan.outcome,
            "keyed entry upserted"
        );
        Ok(updated)
    }

    /// Set the quantity of a cart line, adding the line if the product is
    /// not yet in the cart in that colour
    pub async fn update_cart(&self, id: Uuid, line: CartLine) -> Result<Record> {
        line.validate()?;

        let key = EntryKey::new()
            .with("product", line.product.to_string())
            .with("color", line.color.trim());
        let mut payload = Map::new();
        payload.insert("quantity".into(), Value::from(line.quantity));

        self.upsert_entry(id, &self.cart, key, payload).await
    }

    /// Record a rating, then recompute the stored mean
    ///
    /// The rating and the mean are two separate writes. A reader between
    /// them sees the new rating with the previous mean, and a failure in
    /// the second write leaves the mean stale until the next rating.
    #[tracing::instrument(skip(self), fields(collection = %self.collection.name))]
    pub async fn rate(&self, id: Uuid, rating: RatingInput) -> Result<Record> {
        rating.validate()?;

        let key = EntryKey::single("postedBy", rating.posted_by.to_string());
        let rated = self
            .upsert_entry(id, &self.ratings, key, rating.payload())
            .await?;

        let patch = self.aggregate.patch(&rated)?;
        let updated = self
            .store
            .update_by_id(&id, &patch)
            .await?
            .ok_or_else(|| CatalogError::not_found(self.collection.name.clone(), id))?;

        tracing::info!(
            record_id = %id,
            total = ?updated.get(&self.aggregate.target_field),
            "aggregate recomputed"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRecordStore;
    use serde_json::json;

    fn service() -> CatalogService {
        CatalogService::new(
            Arc::new(InMemoryRecordStore::new()),
            CollectionConfig::products(),
            PagingConfig::default(),
        )
    }

    #[test]
    fn test_rating_payload_omits_absent_comment() {
        let rating = RatingInput::new(Uuid::new_v4(), 4);
        assert_eq!(Value::Object(rating.payload()), json!({ "star": 4 }));

        let rating = rating.with_comment("solid");
        assert_eq!(
            Value::Object(rating.payload()),
            json!({ "star": 4, "comment": "solid" })
        );
    }

    #[test]
    fn test_rating_input_deserializes_camel_case() {
        let id = Uuid::new_v4();
        let rating: RatingInput =
            serde_json::from_value(json!({ "postedBy": id, "star": 5 })).unwrap();
        assert_eq!(rating, RatingInput::new(id, 5));
    }

    #[tokio::test]
    async fn test_rate_rejects_out_of_range_star() {
        let service = service();
        let product = service.insert(Record::new(Uuid::new_v4())).await.unwrap();

        let err = service
            .rate(product.id, RatingInput::new(Uuid::new_v4(), 6))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_cart_rejects_zero_quantity() {
        let service = service();
        let user = service.insert(Record::new(Uuid::new_v4())).await.unwrap();

        let err = service
            .update_cart(user.id, CartLine::new(Uuid::new_v4(), "Red", 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let service = service();
        let err = service
            .toggle(Uuid::new_v4(), Uuid::new_v4(), ToggleSide::A)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "RECORD_NOT_FOUND");
    }
}
