//! Collection-mutation protocol
//!
//! Each strategy inspects a record's current state and plans a single
//! [`Patch`](crate::storage::Patch); the service layer submits it to the
//! store. The `apply` methods run the same plan against a detached record.

pub mod aggregate;
pub mod keyed;
pub mod toggle;

pub use aggregate::AggregateRecomputation;
pub use keyed::{EntryKey, KeyedUpsertList, UpsertOutcome, UpsertPlan};
pub use toggle::{Membership, ToggleSet, ToggleSide, Transition};
