//! Work order lifecycle and stock issuance.
//!
//! ```text
//! create_order ──► pending ──► collecting ──► ready ──► issue() ──► issued
//!                    ▲                                   │
//!                    └──── update_status (any, warned) ──┘
//! ```
//!
//! `update_status` is a plain overwrite so storekeepers can correct mistakes.
//! Only `issue` touches stock, and only once per order: `issued_at` is stamped
//! on first issue and never cleared, so reopening an issued order does not
//! allow a second decrement.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use stockroom_core::{CoreError, CoreResult, UserId, WorkOrderId, require};
use stockroom_workorders::{
    LineStatus, NewWorkOrder, OrderFilter, RandomSuffix, SuffixSource, WorkOrder,
    WorkOrderStatus, order_id,
};

use crate::store::{Store, StoreError, Transaction};

use super::{adjust_in_tx, now};

/// Attempts at allocating a fresh order id before giving up with `Conflict`.
pub const ORDER_ID_ATTEMPTS: usize = 5;

pub struct WorkOrderEngine<S> {
    store: Arc<S>,
    suffixes: Arc<dyn SuffixSource>,
}

impl<S> Clone for WorkOrderEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            suffixes: Arc::clone(&self.suffixes),
        }
    }
}

impl<S> core::fmt::Debug for WorkOrderEngine<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkOrderEngine").finish_non_exhaustive()
    }
}

impl<S: Store> WorkOrderEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            suffixes: Arc::new(RandomSuffix),
        }
    }

    /// Replace the id suffix generator.
    pub fn with_suffix_source(mut self, suffixes: Arc<dyn SuffixSource>) -> Self {
        self.suffixes = suffixes;
        self
    }

    #[instrument(
        skip(self, new),
        fields(equipment = %new.equipment, lines = new.lines.len()),
        err
    )]
    pub async fn create_order(&self, new: NewWorkOrder) -> CoreResult<WorkOrder> {
        new.validate()?;

        for attempt in 1..=ORDER_ID_ATTEMPTS {
            let now = now();
            let id = order_id(now, &self.suffixes.next_suffix());
            let order = WorkOrder::create(id, new.clone(), now)?;

            let mut tx = self.store.begin().await?;
            if let Some(mechanic_id) = order.mechanic_id {
                require(tx.user(mechanic_id).await?, &mechanic_id)?;
            }
            for item_id in new.referenced_items() {
                require(tx.item(item_id).await?, &item_id)?;
            }

            match tx.insert_order(&order).await {
                Ok(()) => {
                    tx.commit().await?;
                    info!(order_id = %order.id, "work order created");
                    return Ok(order);
                }
                Err(StoreError::Conflict(msg)) => {
                    warn!(order_id = %order.id, attempt, %msg, "order id collision, retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(CoreError::conflict(format!(
            "could not allocate a unique work order id after {ORDER_ID_ATTEMPTS} attempts"
        )))
    }

    pub async fn get_order(&self, id: &WorkOrderId) -> CoreResult<WorkOrder> {
        let mut tx = self.store.begin().await?;
        require(tx.order(id).await?, id)
    }

    pub async fn list_orders(&self, filter: OrderFilter) -> CoreResult<Vec<WorkOrder>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.orders(&filter).await?)
    }

    /// Orders assigned to one mechanic, newest first.
    pub async fn orders_for_mechanic(&self, mechanic_id: UserId) -> CoreResult<Vec<WorkOrder>> {
        self.list_orders(OrderFilter {
            mechanic_id: Some(mechanic_id),
        })
        .await
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn update_status(
        &self,
        id: &WorkOrderId,
        status: WorkOrderStatus,
    ) -> CoreResult<WorkOrder> {
        let mut tx = self.store.begin().await?;
        let mut order = require(tx.order_for_update(id).await?, id)?;
        let change = order.set_status(status, now());
        tx.update_order(&order).await?;
        tx.commit().await?;

        if change.is_backwards() {
            warn!(from = %change.from, to = %change.to, "work order status moved backwards");
        }
        if change.to == WorkOrderStatus::Issued && order.issued_at.is_none() {
            warn!("work order marked issued without issuing stock");
        }
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn set_line_status(
        &self,
        id: &WorkOrderId,
        line_no: u32,
        status: LineStatus,
    ) -> CoreResult<WorkOrder> {
        let mut tx = self.store.begin().await?;
        let mut order = require(tx.order_for_update(id).await?, id)?;
        order.set_line_status(line_no, status, now())?;
        tx.update_order(&order).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Decrement stock for every catalog-backed line and mark the order issued.
    ///
    /// All-or-nothing: the first missing item or insufficient stock aborts the
    /// transaction and no quantity changes.
    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn issue(&self, id: &WorkOrderId) -> CoreResult<WorkOrder> {
        let mut tx = self.store.begin().await?;
        let mut order = require(tx.order_for_update(id).await?, id)?;
        order.ensure_issuable()?;

        let now = now();
        // Ascending item order: concurrent issues lock shared rows in the same sequence.
        let demand = order.stock_demand();
        for (item_id, quantity) in &demand {
            adjust_in_tx(&mut tx, *item_id, -quantity, now).await?;
        }
        order.mark_issued(now)?;
        tx.update_order(&order).await?;
        tx.commit().await?;

        info!(items = demand.len(), "work order issued");
        Ok(order)
    }
}
