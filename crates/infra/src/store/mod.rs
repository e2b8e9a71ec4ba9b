//! Transactional persistence boundary.
//!
//! Services never talk to a database directly: they open a [`Transaction`] on an
//! injected [`Store`], do their existence checks and mutations through it, and
//! commit. A transaction that is dropped without `commit` is rolled back, so a
//! failed multi-step operation never leaves partial state behind.
//!
//! ## Row locking
//!
//! `*_for_update` reads lock the row until the transaction ends. Services use
//! them for every read-modify-write (relocate, adjust, issue) so that concurrent
//! callers on the same entity serialise instead of losing updates.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_catalog::{Item, ItemFilter, Location, User};
use stockroom_core::{CoreError, ItemId, LocationId, UserId, WorkOrderId};
use stockroom_ledger::{Movement, NewMovement};
use stockroom_workorders::{OrderFilter, WorkOrder};

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. Uniqueness
/// violations are reported separately so they can surface as `Conflict`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("uniqueness violation: {0}")]
    Conflict(String),

    #[error("row missing: {0}")]
    Missing(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for CoreError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            other => CoreError::Store(other.to_string()),
        }
    }
}

/// Factory for transactions.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: Transaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One unit of work against the store.
///
/// Listing methods return rows in their presentation order:
/// items newest first, locations by code, movements newest first (ties: later
/// append first), orders newest first.
#[async_trait]
pub trait Transaction: Send {
    async fn item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;
    /// Fails with `Conflict` on a duplicate id or SKU.
    async fn insert_item(&mut self, item: &Item) -> Result<(), StoreError>;
    /// Fails with `Conflict` when the new SKU belongs to another item.
    async fn update_item(&mut self, item: &Item) -> Result<(), StoreError>;
    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError>;
    async fn items(&mut self, filter: &ItemFilter) -> Result<Vec<Item>, StoreError>;
    async fn categories(&mut self) -> Result<Vec<String>, StoreError>;

    async fn location(&mut self, id: LocationId) -> Result<Option<Location>, StoreError>;
    /// Fails with `Conflict` on a duplicate code.
    async fn insert_location(&mut self, location: &Location) -> Result<(), StoreError>;
    async fn locations(&mut self) -> Result<Vec<Location>, StoreError>;

    async fn user(&mut self, id: UserId) -> Result<Option<User>, StoreError>;
    /// Fails with `Conflict` on a duplicate username.
    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;

    /// Append to the ledger, assigning the next monotonic movement id.
    async fn append_movement(&mut self, movement: NewMovement) -> Result<Movement, StoreError>;
    async fn movements_for_item(&mut self, id: ItemId) -> Result<Vec<Movement>, StoreError>;

    async fn order(&mut self, id: &WorkOrderId) -> Result<Option<WorkOrder>, StoreError>;
    async fn order_for_update(&mut self, id: &WorkOrderId) -> Result<Option<WorkOrder>, StoreError>;
    /// Stores the order with its lines. Fails with `Conflict` on a duplicate id.
    async fn insert_order(&mut self, order: &WorkOrder) -> Result<(), StoreError>;
    /// Persists header fields and line statuses.
    async fn update_order(&mut self, order: &WorkOrder) -> Result<(), StoreError>;
    async fn orders(&mut self, filter: &OrderFilter) -> Result<Vec<WorkOrder>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    type Tx = S::Tx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        (**self).begin().await
    }
}
