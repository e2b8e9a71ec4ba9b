use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockroom_catalog::{Item, ItemFilter, Location, User};
use stockroom_core::{ItemId, LocationId, MovementId, UserId, WorkOrderId};
use stockroom_ledger::{Movement, NewMovement};
use stockroom_workorders::{OrderFilter, WorkOrder};

use super::{Store, StoreError, Transaction};

#[derive(Debug, Default)]
struct State {
    items: HashMap<ItemId, Item>,
    locations: HashMap<LocationId, Location>,
    users: HashMap<UserId, User>,
    movements: Vec<Movement>,
    orders: HashMap<WorkOrderId, WorkOrder>,
    next_movement_id: u64,
}

/// In-memory transactional store.
///
/// Intended for tests/dev. Transactions are fully serialised: `begin` takes an
/// exclusive lock that is held until the transaction is committed or dropped.
/// Writes apply to the shared state directly and record how to revert them;
/// dropping a transaction without committing replays that log backwards, so an
/// abandoned transaction leaves no trace.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(InMemoryTx {
            guard,
            undo: Vec::new(),
        })
    }
}

/// Reverts one write.
#[derive(Debug)]
enum Undo {
    Item(ItemId, Option<Item>),
    Location(LocationId),
    User(UserId),
    Movement,
    Order(WorkOrderId, Option<WorkOrder>),
}

pub struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    undo: Vec<Undo>,
}

impl InMemoryTx {
    fn view(&self) -> &State {
        &self.guard
    }

    fn rollback(&mut self) {
        let state = &mut *self.guard;
        while let Some(step) = self.undo.pop() {
            match step {
                Undo::Item(id, Some(previous)) => {
                    state.items.insert(id, previous);
                }
                Undo::Item(id, None) => {
                    state.items.remove(&id);
                }
                Undo::Location(id) => {
                    state.locations.remove(&id);
                }
                Undo::User(id) => {
                    state.users.remove(&id);
                }
                Undo::Movement => {
                    state.movements.pop();
                    state.next_movement_id -= 1;
                }
                Undo::Order(id, Some(previous)) => {
                    state.orders.insert(id, previous);
                }
                Undo::Order(id, None) => {
                    state.orders.remove(&id);
                }
            }
        }
    }
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        self.rollback();
    }
}

fn sku_taken(state: &State, sku: &str, except: ItemId) -> bool {
    state
        .items
        .values()
        .any(|other| other.id != except && other.sku == sku)
}

#[async_trait]
impl Transaction for InMemoryTx {
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.view().items.get(&id).cloned())
    }

    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        // The transaction already holds the store-wide lock.
        self.item(id).await
    }

    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError> {
        let state = &mut *self.guard;
        if state.items.contains_key(&item.id) {
            return Err(StoreError::Conflict(format!("item id {} exists", item.id)));
        }
        if sku_taken(state, &item.sku, item.id) {
            return Err(StoreError::Conflict(format!("sku '{}' already in use", item.sku)));
        }
        state.items.insert(item.id, item.clone());
        self.undo.push(Undo::Item(item.id, None));
        Ok(())
    }

    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError> {
        let state = &mut *self.guard;
        if !state.items.contains_key(&item.id) {
            return Err(StoreError::Missing(format!("item {}", item.id)));
        }
        if sku_taken(state, &item.sku, item.id) {
            return Err(StoreError::Conflict(format!("sku '{}' already in use", item.sku)));
        }
        let previous = state.items.insert(item.id, item.clone());
        self.undo.push(Undo::Item(item.id, previous));
        Ok(())
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError> {
        match self.guard.items.remove(&id) {
            Some(previous) => {
                self.undo.push(Undo::Item(id, Some(previous)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn items(&mut self, filter: &ItemFilter) -> Result<Vec<Item>, StoreError> {
        let mut items: Vec<Item> = self
            .view()
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn categories(&mut self) -> Result<Vec<String>, StoreError> {
        let categories: BTreeSet<String> = self
            .view()
            .items
            .values()
            .filter(|item| !item.category.is_empty())
            .map(|item| item.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn location(&mut self, id: LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.view().locations.get(&id).cloned())
    }

    async fn insert_location(&mut self, location: &Location) -> Result<(), StoreError> {
        let state = &mut *self.guard;
        if state.locations.contains_key(&location.id)
            || state.locations.values().any(|l| l.code == location.code)
        {
            return Err(StoreError::Conflict(format!(
                "location code '{}' already in use",
                location.code
            )));
        }
        state.locations.insert(location.id, location.clone());
        self.undo.push(Undo::Location(location.id));
        Ok(())
    }

    async fn locations(&mut self) -> Result<Vec<Location>, StoreError> {
        let mut locations: Vec<Location> = self.view().locations.values().cloned().collect();
        locations.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(locations)
    }

    async fn user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.view().users.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        let state = &mut *self.guard;
        if state.users.contains_key(&user.id)
            || state.users.values().any(|u| u.username == user.username)
        {
            return Err(StoreError::Conflict(format!(
                "username '{}' already in use",
                user.username
            )));
        }
        state.users.insert(user.id, user.clone());
        self.undo.push(Undo::User(user.id));
        Ok(())
    }

    async fn append_movement(&mut self, movement: NewMovement) -> Result<Movement, StoreError> {
        let state = &mut *self.guard;
        state.next_movement_id += 1;
        let committed = movement.into_committed(MovementId(state.next_movement_id));
        state.movements.push(committed.clone());
        self.undo.push(Undo::Movement);
        Ok(committed)
    }

    async fn movements_for_item(&mut self, id: ItemId) -> Result<Vec<Movement>, StoreError> {
        let mut movements: Vec<Movement> = self
            .view()
            .movements
            .iter()
            .filter(|m| m.item_id == id)
            .cloned()
            .collect();
        movements.sort_by(Movement::newest_first);
        Ok(movements)
    }

    async fn order(&mut self, id: &WorkOrderId) -> Result<Option<WorkOrder>, StoreError> {
        Ok(self.view().orders.get(id).cloned())
    }

    async fn order_for_update(&mut self, id: &WorkOrderId) -> Result<Option<WorkOrder>, StoreError> {
        self.order(id).await
    }

    async fn insert_order(&mut self, order: &WorkOrder) -> Result<(), StoreError> {
        let state = &mut *self.guard;
        if state.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("work order id {} exists", order.id)));
        }
        state.orders.insert(order.id.clone(), order.clone());
        self.undo.push(Undo::Order(order.id.clone(), None));
        Ok(())
    }

    async fn update_order(&mut self, order: &WorkOrder) -> Result<(), StoreError> {
        let state = &mut *self.guard;
        match state.orders.get_mut(&order.id) {
            Some(existing) => {
                let previous = std::mem::replace(existing, order.clone());
                self.undo.push(Undo::Order(order.id.clone(), Some(previous)));
                Ok(())
            }
            None => Err(StoreError::Missing(format!("work order {}", order.id))),
        }
    }

    async fn orders(&mut self, filter: &OrderFilter) -> Result<Vec<WorkOrder>, StoreError> {
        let mut orders: Vec<WorkOrder> = self
            .view()
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        self.undo.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_catalog::NewItem;

    fn item(sku: &str) -> Item {
        Item::create(
            ItemId::new(),
            NewItem {
                name: format!("Part {sku}"),
                sku: sku.to_string(),
                quantity: 1,
                ..NewItem::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryStore::new();
        let it = item("SKU-1");

        let mut tx = store.begin().await.unwrap();
        tx.insert_item(&it).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.item(it.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropped_transaction_restores_updated_and_deleted_rows() {
        let store = InMemoryStore::new();
        let kept = item("SKU-1");
        let removed = item("SKU-2");
        let mut tx = store.begin().await.unwrap();
        tx.insert_item(&kept).await.unwrap();
        tx.insert_item(&removed).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let mut changed = kept.clone();
        changed.quantity = 99;
        tx.update_item(&changed).await.unwrap();
        changed.quantity = 42;
        tx.update_item(&changed).await.unwrap();
        assert!(tx.delete_item(removed.id).await.unwrap());
        assert_eq!(tx.item(kept.id).await.unwrap().unwrap().quantity, 42);
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.item(kept.id).await.unwrap(), Some(kept));
        assert_eq!(tx.item(removed.id).await.unwrap(), Some(removed));
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_later_transactions() {
        let store = InMemoryStore::new();
        let it = item("SKU-1");

        let mut tx = store.begin().await.unwrap();
        tx.insert_item(&it).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.item(it.id).await.unwrap(), Some(it));
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_item(&item("SKU-1")).await.unwrap();
        let err = tx.insert_item(&item("SKU-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn movement_ids_are_monotonic_across_transactions() {
        let store = InMemoryStore::new();
        let item_id = ItemId::new();
        let new = |note: &str| NewMovement {
            item_id,
            from_location_id: None,
            to_location_id: LocationId::new(),
            user_id: UserId::new(),
            note: note.to_string(),
            moved_at: Utc::now(),
        };

        let mut tx = store.begin().await.unwrap();
        let first = tx.append_movement(new("a")).await.unwrap();
        tx.commit().await.unwrap();

        // A rolled-back append does not consume an id.
        let mut tx = store.begin().await.unwrap();
        tx.append_movement(new("discarded")).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        let second = tx.append_movement(new("b")).await.unwrap();
        tx.commit().await.unwrap();

        assert!(second.id > first.id);
        let mut tx = store.begin().await.unwrap();
        let history = tx.movements_for_item(item_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].note, "b");
    }

    proptest::proptest! {
        /// Property: only committed transactions leave items behind.
        #[test]
        fn only_committed_inserts_survive(commits in proptest::collection::vec(proptest::bool::ANY, 1..30)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = InMemoryStore::new();
            let survivors = rt.block_on(async {
                for (n, commit) in commits.iter().enumerate() {
                    let mut tx = store.begin().await.unwrap();
                    tx.insert_item(&item(&format!("SKU-{n}"))).await.unwrap();
                    if *commit {
                        tx.commit().await.unwrap();
                    }
                }
                let mut tx = store.begin().await.unwrap();
                tx.items(&ItemFilter::default()).await.unwrap().len()
            });
            proptest::prop_assert_eq!(survivors, commits.iter().filter(|c| **c).count());
        }
    }
}
