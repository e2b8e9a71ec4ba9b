use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, ItemId, LocationId, MovementId, UserId};

/// A movement ready to be appended to the ledger (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub item_id: ItemId,
    /// `None` when the item had no location before the move.
    pub from_location_id: Option<LocationId>,
    pub to_location_id: LocationId,
    pub user_id: UserId,
    pub note: String,
    pub moved_at: DateTime<Utc>,
}

/// A committed ledger record. Never updated or deleted after creation.
///
/// ## Ids
///
/// Ids are assigned by the store during append and are:
/// - **Monotonically increasing** across the whole ledger
/// - **Immutable**: once assigned, never reused
///
/// They double as the append-order tie breaker when two movements share a
/// `moved_at` timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: LocationId,
    pub user_id: UserId,
    pub note: String,
    pub moved_at: DateTime<Utc>,
}

impl Entity for Movement {
    type Id = MovementId;
    const KIND: &'static str = "movement";

    fn id(&self) -> &MovementId {
        &self.id
    }
}

impl NewMovement {
    /// Attach the store-assigned id.
    pub fn into_committed(self, id: MovementId) -> Movement {
        Movement {
            id,
            item_id: self.item_id,
            from_location_id: self.from_location_id,
            to_location_id: self.to_location_id,
            user_id: self.user_id,
            note: self.note,
            moved_at: self.moved_at,
        }
    }
}

impl Movement {
    /// History order: most recent `moved_at` first, later appends first on ties.
    pub fn newest_first(a: &Movement, b: &Movement) -> Ordering {
        b.moved_at.cmp(&a.moved_at).then_with(|| b.id.cmp(&a.id))
    }
}

/// Materialised movement history of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub item_id: ItemId,
    pub movements: Vec<Movement>,
    pub total: usize,
}

impl History {
    /// Build a history from the item's movements in any order.
    pub fn new(item_id: ItemId, mut movements: Vec<Movement>) -> Self {
        movements.sort_by(Movement::newest_first);
        let total = movements.len();
        Self {
            item_id,
            movements,
            total,
        }
    }

    pub fn latest(&self) -> Option<&Movement> {
        self.movements.first()
    }
}
