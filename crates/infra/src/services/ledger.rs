use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use stockroom_core::{CoreResult, ItemId, LocationId, UserId, require};
use stockroom_ledger::{Movement, NewMovement};

use crate::store::{Store, Transaction};

use super::now;

/// Request to move an item to another location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocateRequest {
    pub item_id: ItemId,
    pub to_location_id: LocationId,
    pub user_id: UserId,
    #[serde(default)]
    pub note: String,
}

/// Records item relocations.
///
/// A relocation updates the item's current location and appends the matching
/// ledger record in one transaction: either both are visible or neither is.
#[derive(Debug)]
pub struct MovementLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for MovementLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> MovementLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Move an item, returning the committed movement.
    ///
    /// Existence is checked item, then destination, then user; the first
    /// missing one is reported. Moving to the current location is allowed and
    /// still recorded.
    #[instrument(
        skip(self, req),
        fields(item_id = %req.item_id, to = %req.to_location_id, user_id = %req.user_id),
        err
    )]
    pub async fn relocate(&self, req: RelocateRequest) -> CoreResult<Movement> {
        let mut tx = self.store.begin().await?;

        let mut item = require(tx.item_for_update(req.item_id).await?, &req.item_id)?;
        require(tx.location(req.to_location_id).await?, &req.to_location_id)?;
        require(tx.user(req.user_id).await?, &req.user_id)?;

        let now = now();
        let from = item.relocate(req.to_location_id, now);
        tx.update_item(&item).await?;
        let movement = tx
            .append_movement(NewMovement {
                item_id: item.id,
                from_location_id: from,
                to_location_id: req.to_location_id,
                user_id: req.user_id,
                note: req.note,
                moved_at: now,
            })
            .await?;
        tx.commit().await?;

        info!(
            movement_id = %movement.id,
            from = ?movement.from_location_id,
            "item relocated"
        );
        Ok(movement)
    }
}
