//! Integration tests for the service layer.
//!
//! Every scenario is generic over the store and runs against the in-memory
//! store; the same scenarios run against Postgres when `DATABASE_URL` is set
//! and ignored tests are enabled.
//!
//! Verifies:
//! - Relocations keep the item's location and the ledger in step
//! - Issuance is all-or-nothing and happens at most once per order
//! - Concurrent callers never lose updates, deadlock, or drive stock negative
//! - Values returned by writes equal the values read back

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stockroom_catalog::{Item, ItemFilter, Location, NewItem, NewLocation, NewUser, Role, User};
    use stockroom_core::{CoreError, ItemId, LocationId, UserId};
    use stockroom_workorders::{NewLine, NewWorkOrder, WorkOrder, WorkOrderStatus};

    use crate::services::{Catalog, HistoryReader, MovementLedger, RelocateRequest, WorkOrderEngine};
    use crate::store::{InMemoryStore, PostgresStore, Store};

    struct Fixture<S> {
        catalog: Catalog<S>,
        ledger: MovementLedger<S>,
        history: HistoryReader<S>,
        orders: WorkOrderEngine<S>,
        /// Appended to codes, SKUs and usernames so runs against a shared
        /// database do not collide.
        tag: String,
    }

    fn fixture<S: Store>(store: S) -> Fixture<S> {
        let store = Arc::new(store);
        let tag = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        Fixture {
            catalog: Catalog::new(Arc::clone(&store)),
            ledger: MovementLedger::new(Arc::clone(&store)),
            history: HistoryReader::new(Arc::clone(&store)),
            orders: WorkOrderEngine::new(store),
            tag,
        }
    }

    fn in_memory_fixture() -> Fixture<InMemoryStore> {
        fixture(InMemoryStore::new())
    }

    async fn postgres_fixture() -> Fixture<PostgresStore> {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PostgresStore::connect(&url, 8).await.unwrap();
        store.migrate().await.unwrap();
        fixture(store)
    }

    impl<S: Store> Fixture<S> {
        async fn location(&self, code: &str) -> Location {
            self.catalog
                .create_location(NewLocation {
                    code: format!("{code}-{}", self.tag),
                    ..NewLocation::default()
                })
                .await
                .unwrap()
        }

        fn sku(&self, sku: &str) -> String {
            format!("{sku}-{}", self.tag)
        }

        async fn item(&self, sku: &str, quantity: i64) -> Item {
            self.catalog
                .create_item(NewItem {
                    name: format!("Part {sku}"),
                    sku: self.sku(sku),
                    quantity,
                    ..NewItem::default()
                })
                .await
                .unwrap()
        }

        async fn operator(&self) -> User {
            let username = format!("operator-{}", self.tag);
            self.catalog
                .create_user(NewUser {
                    email: format!("{username}@warehouse.local"),
                    username,
                    password_hash: String::new(),
                    role: Role::Operator,
                })
                .await
                .unwrap()
        }

        async fn quantity(&self, id: ItemId) -> i64 {
            self.catalog.get_item(id).await.unwrap().quantity
        }

        async fn order_for(&self, lines: &[(ItemId, i64)]) -> WorkOrder {
            self.orders
                .create_order(NewWorkOrder {
                    equipment: "Excavator CAT 320".to_string(),
                    equipment_number: "INV-0042".to_string(),
                    work_type: "repair".to_string(),
                    lines: lines
                        .iter()
                        .map(|(item_id, quantity)| NewLine {
                            item_id: Some(*item_id),
                            name: "Part".to_string(),
                            quantity: *quantity,
                            ..NewLine::default()
                        })
                        .collect(),
                    ..NewWorkOrder::default()
                })
                .await
                .unwrap()
        }

        fn relocation(&self, item_id: ItemId, to: LocationId, user_id: UserId, note: &str) -> RelocateRequest {
            RelocateRequest {
                item_id,
                to_location_id: to,
                user_id,
                note: note.to_string(),
            }
        }
    }

    /// Instantiates each scenario once per store.
    macro_rules! scenarios {
        ($($name:ident),* $(,)?) => {
            mod in_memory {
                $(
                    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
                    async fn $name() {
                        super::$name(super::in_memory_fixture()).await;
                    }
                )*
            }

            mod postgres {
                $(
                    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
                    #[ignore = "requires DATABASE_URL pointing at a disposable Postgres"]
                    async fn $name() {
                        super::$name(super::postgres_fixture().await).await;
                    }
                )*
            }
        };
    }

    scenarios!(
        relocation_history_newest_first,
        relocate_reports_first_missing_entity,
        deleted_item_history_is_not_found,
        issue_decrements_once,
        failing_line_rolls_back_whole_issue,
        issue_with_deleted_item_is_not_found,
        written_records_equal_read_back_records,
        concurrent_adjustments_exhaust_stock_exactly,
        concurrent_issue_of_one_order_decrements_once,
        concurrent_relocations_leave_item_at_last_movement,
        opposite_line_orders_issue_without_deadlock,
        item_listing_is_unaffected_by_failed_creation,
    );

    async fn relocation_history_newest_first<S: Store>(fx: Fixture<S>) {
        let a1 = fx.location("LOC-A1").await;
        let b1 = fx.location("LOC-B1").await;
        let item = fx.item("WDGT-001", 50).await;
        let user = fx.operator().await;

        let first = fx
            .ledger
            .relocate(fx.relocation(item.id, a1.id, user.id, "received"))
            .await
            .unwrap();
        assert_eq!(first.from_location_id, None);

        fx.ledger
            .relocate(fx.relocation(item.id, b1.id, user.id, "restock"))
            .await
            .unwrap();

        let history = fx.history.history_of(item.id).await.unwrap();
        assert_eq!(history.total, 2);
        assert_eq!(history.movements[0].from_location_id, Some(a1.id));
        assert_eq!(history.movements[0].to_location_id, b1.id);
        assert_eq!(history.movements[0].note, "restock");
        assert_eq!(history.movements[1].to_location_id, a1.id);

        let stored = fx.catalog.get_item(item.id).await.unwrap();
        assert_eq!(stored.location_id, Some(b1.id));
        assert_eq!(stored.quantity, 50);
    }

    async fn relocate_reports_first_missing_entity<S: Store>(fx: Fixture<S>) {
        let loc = fx.location("LOC-A1").await;
        let item = fx.item("WDGT-001", 1).await;
        let user = fx.operator().await;

        let missing_item = fx
            .ledger
            .relocate(fx.relocation(ItemId::new(), LocationId::new(), user.id, ""))
            .await;
        assert!(matches!(missing_item, Err(CoreError::NotFound { entity: "item", .. })));

        let missing_user = fx
            .ledger
            .relocate(fx.relocation(item.id, loc.id, UserId::new(), ""))
            .await;
        assert!(matches!(missing_user, Err(CoreError::NotFound { entity: "user", .. })));

        // Nothing was recorded and the item did not move.
        assert_eq!(fx.history.history_of(item.id).await.unwrap().total, 0);
        assert_eq!(fx.catalog.get_item(item.id).await.unwrap().location_id, None);
    }

    async fn deleted_item_history_is_not_found<S: Store>(fx: Fixture<S>) {
        let item = fx.item("WDGT-001", 1).await;
        fx.catalog.delete_item(item.id).await.unwrap();
        assert!(matches!(
            fx.history.history_of(item.id).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    async fn issue_decrements_once<S: Store>(fx: Fixture<S>) {
        let item = fx.item("WDGT-001", 50).await;
        let order = fx.order_for(&[(item.id, 10)]).await;

        let issued = fx.orders.issue(&order.id).await.unwrap();
        assert_eq!(issued.status, WorkOrderStatus::Issued);
        assert!(issued.issued_at.is_some());
        assert_eq!(fx.quantity(item.id).await, 40);

        let again = fx.orders.issue(&order.id).await.unwrap_err();
        assert!(matches!(again, CoreError::InvalidState(msg) if msg.contains("already issued")));
        assert_eq!(fx.quantity(item.id).await, 40);
    }

    async fn failing_line_rolls_back_whole_issue<S: Store>(fx: Fixture<S>) {
        let plenty = fx.item("WDGT-001", 50).await;
        let scarce = fx.item("GDGT-002", 2).await;
        let order = fx.order_for(&[(plenty.id, 10), (scarce.id, 5)]).await;

        let err = fx.orders.issue(&order.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        assert_eq!(fx.quantity(plenty.id).await, 50);
        assert_eq!(fx.quantity(scarce.id).await, 2);
        let stored = fx.orders.get_order(&order.id).await.unwrap();
        assert_eq!(stored.status, WorkOrderStatus::Pending);
        assert_eq!(stored.issued_at, None);
    }

    async fn issue_with_deleted_item_is_not_found<S: Store>(fx: Fixture<S>) {
        let item = fx.item("WDGT-001", 5).await;
        let order = fx.order_for(&[(item.id, 1)]).await;
        fx.catalog.delete_item(item.id).await.unwrap();

        assert!(matches!(
            fx.orders.issue(&order.id).await,
            Err(CoreError::NotFound { entity: "item", .. })
        ));
        assert!(!fx.orders.get_order(&order.id).await.unwrap().is_issued());
    }

    async fn written_records_equal_read_back_records<S: Store>(fx: Fixture<S>) {
        let loc = fx.location("LOC-A1").await;
        let user = fx.operator().await;
        let item = fx.item("WDGT-001", 5).await;
        assert_eq!(fx.catalog.get_item(item.id).await.unwrap(), item);
        assert_eq!(fx.catalog.get_location(loc.id).await.unwrap(), loc);
        assert_eq!(fx.catalog.get_user(user.id).await.unwrap(), user);

        let movement = fx
            .ledger
            .relocate(fx.relocation(item.id, loc.id, user.id, "received"))
            .await
            .unwrap();
        let history = fx.history.history_of(item.id).await.unwrap();
        assert_eq!(history.movements, vec![movement]);

        let adjusted = fx.catalog.adjust_quantity(item.id, 2).await.unwrap();
        assert_eq!(fx.catalog.get_item(item.id).await.unwrap(), adjusted);

        let order = fx.order_for(&[(item.id, 1)]).await;
        assert_eq!(fx.orders.get_order(&order.id).await.unwrap(), order);
        let issued = fx.orders.issue(&order.id).await.unwrap();
        assert_eq!(fx.orders.get_order(&order.id).await.unwrap(), issued);
    }

    async fn concurrent_adjustments_exhaust_stock_exactly<S: Store>(fx: Fixture<S>) {
        let item_id = fx.item("WDGT-001", 10).await.id;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let catalog = fx.catalog.clone();
            handles.push(tokio::spawn(async move { catalog.adjust_quantity(item_id, -3).await }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(CoreError::InvalidState(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(ok, 3);
        assert_eq!(fx.quantity(item_id).await, 1);
    }

    async fn concurrent_issue_of_one_order_decrements_once<S: Store>(fx: Fixture<S>) {
        let item = fx.item("WDGT-001", 50).await;
        let order = fx.order_for(&[(item.id, 10)]).await;

        let mut handles = Vec::new();
        for _ in 0..6 {
            let orders = fx.orders.clone();
            let id = order.id.clone();
            handles.push(tokio::spawn(async move { orders.issue(&id).await }));
        }
        let mut issued = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => issued += 1,
                Err(CoreError::InvalidState(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(issued, 1);
        assert_eq!(fx.quantity(item.id).await, 40);
    }

    async fn concurrent_relocations_leave_item_at_last_movement<S: Store>(fx: Fixture<S>) {
        let item = fx.item("WDGT-001", 1).await;
        let user = fx.operator().await;
        let mut targets = Vec::new();
        for code in ["LOC-A1", "LOC-A2", "LOC-B1", "LOC-B2"] {
            targets.push(fx.location(code).await.id);
        }
        let (item_id, user_id) = (item.id, user.id);

        let mut handles = Vec::new();
        for round in 0..20 {
            let ledger = fx.ledger.clone();
            let request = fx.relocation(item_id, targets[round % targets.len()], user_id, &format!("scan {round}"));
            handles.push(tokio::spawn(async move { ledger.relocate(request).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let history = fx.history.history_of(item_id).await.unwrap();
        assert_eq!(history.total, 20);

        // Each movement starts where the previous one (in append order) ended.
        let mut chain = history.movements.clone();
        chain.sort_by_key(|m| m.id);
        for pair in chain.windows(2) {
            assert_eq!(pair[1].from_location_id, Some(pair[0].to_location_id));
        }
        let last = chain.last().unwrap();
        let stored = fx.catalog.get_item(item_id).await.unwrap();
        assert_eq!(stored.location_id, Some(last.to_location_id));
    }

    async fn opposite_line_orders_issue_without_deadlock<S: Store>(fx: Fixture<S>) {
        for round in 0..20 {
            let a = fx.item(&format!("A{round}"), 10).await;
            let b = fx.item(&format!("B{round}"), 10).await;
            let forward = fx.order_for(&[(a.id, 1), (b.id, 1)]).await;
            let backward = fx.order_for(&[(b.id, 2), (a.id, 2)]).await;

            let (first, second) = tokio::join!(
                fx.orders.issue(&forward.id),
                fx.orders.issue(&backward.id)
            );
            if let Err(err) = first.and(second) {
                panic!("round {round}: {err}");
            }
            assert_eq!(fx.quantity(a.id).await, 7);
            assert_eq!(fx.quantity(b.id).await, 7);
        }
    }

    async fn item_listing_is_unaffected_by_failed_creation<S: Store>(fx: Fixture<S>) {
        fx.item("WDGT-001", 1).await;
        let dup = fx
            .catalog
            .create_item(NewItem {
                name: "Other".to_string(),
                sku: fx.sku("WDGT-001"),
                ..NewItem::default()
            })
            .await;
        assert!(matches!(dup, Err(CoreError::Conflict(_))));

        let mine = ItemFilter {
            search: Some(fx.tag.clone()),
            ..ItemFilter::default()
        };
        assert_eq!(fx.catalog.list_items(mine).await.unwrap().len(), 1);
    }
}
