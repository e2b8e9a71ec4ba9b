//! Application services: the operations exposed to the request layer.
//!
//! Each service owns a shared handle to a [`Store`](crate::store::Store) and runs
//! every operation inside a single store transaction. Existence checks happen
//! inside the same transaction as the writes they guard, so a referenced entity
//! cannot disappear between the check and the mutation.

pub mod catalog;
pub mod history;
pub mod ledger;
pub mod work_orders;

pub use catalog::{Catalog, ItemDetail};
pub use history::{DetailedHistory, HistoryReader, MovementDetail};
pub use ledger::{MovementLedger, RelocateRequest};
pub use work_orders::WorkOrderEngine;

use chrono::{DateTime, SubsecRound, Utc};

use stockroom_catalog::{Batch, Item};
use stockroom_core::{CoreResult, ItemId, require};

use crate::store::Transaction;

/// Digits of sub-second precision kept by every store (Postgres `TIMESTAMPTZ`).
const TIMESTAMP_PRECISION: u16 = 6;

/// Current time, truncated to what the stores persist.
///
/// Every timestamp written by a service comes from here, so a value returned
/// to the caller equals the value read back later.
pub(crate) fn now() -> DateTime<Utc> {
    to_store_precision(Utc::now())
}

pub(crate) fn to_store_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(TIMESTAMP_PRECISION)
}

/// Caller-supplied batch arrival times get the same truncation.
pub(crate) fn normalize_batch(batch: &mut Batch) {
    batch.arrived_at = batch.arrived_at.map(to_store_precision);
}

/// Lock `item_id`, apply `delta` and write it back, all within `tx`.
///
/// Shared by direct adjustments and work order issuance so both paths enforce
/// the non-negative stock rule identically.
pub(crate) async fn adjust_in_tx<T: Transaction>(
    tx: &mut T,
    item_id: ItemId,
    delta: i64,
    now: DateTime<Utc>,
) -> CoreResult<Item> {
    let mut item = require(tx.item_for_update(item_id).await?, &item_id)?;
    item.adjust(delta, now)?;
    tx.update_item(&item).await?;
    Ok(item)
}
