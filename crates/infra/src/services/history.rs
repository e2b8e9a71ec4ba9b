use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use stockroom_core::{CoreResult, ItemId, LocationId, UserId, require};
use stockroom_ledger::{History, Movement};

use crate::store::{Store, Transaction};

/// A movement with the codes of both locations and the actor's username.
///
/// The names are resolved when the history is read; `None` means the
/// referenced row no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementDetail {
    #[serde(flatten)]
    pub movement: Movement,
    pub from_location_code: Option<String>,
    pub to_location_code: Option<String>,
    pub username: Option<String>,
}

/// [`History`] with every movement resolved to a [`MovementDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedHistory {
    pub item_id: ItemId,
    pub movements: Vec<MovementDetail>,
    pub total: usize,
}

/// Read side of the movement ledger.
#[derive(Debug)]
pub struct HistoryReader<S> {
    store: Arc<S>,
}

impl<S> Clone for HistoryReader<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> HistoryReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All movements of an existing item, newest first.
    ///
    /// Items that were deleted report `NotFound` even though their records
    /// remain in the ledger.
    pub async fn history_of(&self, item_id: ItemId) -> CoreResult<History> {
        let mut tx = self.store.begin().await?;
        require(tx.item(item_id).await?, &item_id)?;
        let movements = tx.movements_for_item(item_id).await?;
        Ok(History::new(item_id, movements))
    }

    /// Like [`history_of`](Self::history_of), with location codes and
    /// usernames filled in from the same snapshot.
    pub async fn detailed_history_of(&self, item_id: ItemId) -> CoreResult<DetailedHistory> {
        let mut tx = self.store.begin().await?;
        require(tx.item(item_id).await?, &item_id)?;
        let history = History::new(item_id, tx.movements_for_item(item_id).await?);

        let mut codes: HashMap<LocationId, Option<String>> = HashMap::new();
        let mut usernames: HashMap<UserId, Option<String>> = HashMap::new();
        let mut movements = Vec::with_capacity(history.total);
        for movement in history.movements {
            let mut ids = vec![movement.to_location_id];
            ids.extend(movement.from_location_id);
            for id in ids {
                if !codes.contains_key(&id) {
                    let code = tx.location(id).await?.map(|l| l.code);
                    codes.insert(id, code);
                }
            }
            if !usernames.contains_key(&movement.user_id) {
                let username = tx.user(movement.user_id).await?.map(|u| u.username);
                usernames.insert(movement.user_id, username);
            }

            movements.push(MovementDetail {
                from_location_code: movement
                    .from_location_id
                    .and_then(|id| codes.get(&id).cloned().flatten()),
                to_location_code: codes.get(&movement.to_location_id).cloned().flatten(),
                username: usernames.get(&movement.user_id).cloned().flatten(),
                movement,
            });
        }

        Ok(DetailedHistory {
            item_id,
            total: movements.len(),
            movements,
        })
    }
}
