//! Work order domain module.
//!
//! Mechanic requests for parts: the order/line model, the status lifecycle and
//! human-readable id generation. Pure domain logic (no IO, no HTTP, no storage).

pub mod id;
pub mod order;

pub use id::{order_id, RandomSuffix, SuffixSource};
pub use order::{
    LineStatus, NewLine, NewWorkOrder, OrderFilter, Priority, StatusChange, WorkOrder,
    WorkOrderLine, WorkOrderStatus,
};
