use serde::{Deserialize, Serialize};

use stockroom_workorders::WorkOrder;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AdjustQuantityRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub item_id: String,
    pub to_location_id: String,
    pub user_id: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub mechanic_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Work order as returned over HTTP: the order plus its line count.
#[derive(Debug, Serialize)]
pub struct WorkOrderResponse {
    #[serde(flatten)]
    pub order: WorkOrder,
    pub items_count: usize,
}

impl From<WorkOrder> for WorkOrderResponse {
    fn from(order: WorkOrder) -> Self {
        Self {
            items_count: order.items_count(),
            order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}
