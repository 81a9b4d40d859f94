//! Two mutually exclusive membership lists (likes / dislikes)
//!
//! Per (record, actor) the state is one of [`Membership::Neither`],
//! [`Membership::InA`] or [`Membership::InB`]. A toggle on either side first
//! clears an existing membership; only from `Neither` does it add the actor.
//! Switching sides therefore takes two calls, and repeating a call
//! alternates between present and absent.
//!
//! ```text
//!            toggle A                 toggle B
//! Neither ────────────▶ InA   Neither ────────────▶ InB
//! InA     ────────────▶ Neither  InA  ────────────▶ Neither
//! InB     ────────────▶ Neither  InB  ────────────▶ Neither
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::StorageError;
use crate::core::record::Record;
use crate::storage::Patch;

/// Which list an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToggleSide {
    A,
    B,
}

/// Where an actor currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Membership {
    Neither,
    InA,
    InB,
}

impl Membership {
    /// Next state after a toggle on `side`
    pub fn toggle(self, side: ToggleSide) -> Membership {
        match (self, side) {
            (Membership::Neither, ToggleSide::A) => Membership::InA,
            (Membership::Neither, ToggleSide::B) => Membership::InB,
            (Membership::InA, ToggleSide::A) => Membership::Neither,
            (Membership::InB, ToggleSide::B) => Membership::Neither,
            // Opposing membership is cleared, the requested side is not set
            (Membership::InB, ToggleSide::A) => Membership::Neither,
            (Membership::InA, ToggleSide::B) => Membership::Neither,
        }
    }
}

/// A planned toggle: the state change and the one patch that performs it
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: Membership,
    pub to: Membership,
    pub patch: Patch,
}

/// The pair of list fields a toggle operates on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleSet {
    pub a: String,
    pub b: String,
}

impl ToggleSet {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// `likes` / `dislikes`
    pub fn likes() -> Self {
        Self::new("likes", "dislikes")
    }

    pub fn field(&self, side: ToggleSide) -> &str {
        match side {
            ToggleSide::A => &self.a,
            ToggleSide::B => &self.b,
        }
    }

    /// Current membership of `actor`
    ///
    /// An actor found in both lists violates the pair's invariant and is
    /// reported as an integrity error.
    pub fn membership(&self, record: &Record, actor: &str) -> Result<Membership, StorageError> {
        let in_a = contains(record.list(&self.a)?, actor);
        let in_b = contains(record.list(&self.b)?, actor);

        match (in_a, in_b) {
            (false, false) => Ok(Membership::Neither),
            (true, false) => Ok(Membership::InA),
            (false, true) => Ok(Membership::InB),
            (true, true) => Err(StorageError::integrity(format!(
                "actor '{}' is in both '{}' and '{}' of record {}",
                actor, self.a, self.b, record.id
            ))),
        }
    }

    /// Decide the transition for a toggle on `side`
    pub fn plan(&self, record: &Record, actor: &str, side: ToggleSide) -> Result<Transition, StorageError> {
        let from = self.membership(record, actor)?;
        let to = from.toggle(side);

        let patch = match (from, to) {
            (Membership::Neither, Membership::InA) => Patch::push(self.a.clone(), actor),
            (Membership::Neither, Membership::InB) => Patch::push(self.b.clone(), actor),
            (Membership::InA, Membership::Neither) => Patch::pull(self.a.clone(), actor),
            (Membership::InB, Membership::Neither) => Patch::pull(self.b.clone(), actor),
            (from, to) => {
                return Err(StorageError::integrity(format!(
                    "no single-step transition from {:?} to {:?}",
                    from, to
                )));
            }
        };

        Ok(Transition { from, to, patch })
    }

    /// Toggle on a detached record
    pub fn apply(&self, record: &Record, actor: &str, side: ToggleSide) -> Result<Record, StorageError> {
        let transition = self.plan(record, actor, side)?;
        let mut next = record.clone();
        transition.patch.apply_to(&mut next, None)?;
        Ok(next)
    }
}

impl Default for ToggleSet {
    fn default() -> Self {
        Self::likes()
    }
}

fn contains(list: &[Value], actor: &str) -> bool {
    list.iter().any(|item| item.as_str() == Some(actor))
}
