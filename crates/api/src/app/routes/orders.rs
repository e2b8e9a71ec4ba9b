use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use stockroom_core::{UserId, WorkOrderId};
use stockroom_infra::store::Store;
use stockroom_workorders::{LineStatus, NewWorkOrder, OrderFilter, WorkOrderStatus};

use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router<S: Store>() -> Router {
    Router::new()
        .route("/", post(create_order::<S>).get(list_orders::<S>))
        .route("/:id", get(get_order::<S>))
        .route("/:id/status", put(update_status::<S>))
        .route("/:id/lines/:line_no/status", put(set_line_status::<S>))
        .route("/:id/issue", post(issue::<S>))
}

pub async fn create_order<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    payload: Result<Json<NewWorkOrder>, JsonRejection>,
) -> axum::response::Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::CREATED,
        services
            .orders
            .create_order(new)
            .await
            .map(dto::WorkOrderResponse::from),
    )
}

pub async fn list_orders<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Query(query): Query<dto::OrderListQuery>,
) -> axum::response::Response {
    let mechanic_id = match query.mechanic_id.as_deref().filter(|s| !s.trim().is_empty()) {
        None => None,
        Some(raw) => match errors::parse_param::<UserId>(raw) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        },
    };
    let orders = services
        .orders
        .list_orders(OrderFilter { mechanic_id })
        .await
        .map(|orders| {
            dto::ListResponse::new(orders.into_iter().map(dto::WorkOrderResponse::from).collect())
        });
    respond(StatusCode::OK, orders)
}

pub async fn get_order<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WorkOrderId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services.orders.get_order(&id).await.map(dto::WorkOrderResponse::from),
    )
}

pub async fn update_status<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::StatusRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: WorkOrderId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status: WorkOrderStatus = match errors::parse_param(&body.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services
            .orders
            .update_status(&id, status)
            .await
            .map(dto::WorkOrderResponse::from),
    )
}

pub async fn set_line_status<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path((id, line_no)): Path<(String, String)>,
    payload: Result<Json<dto::StatusRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: WorkOrderId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let line_no: u32 = match line_no.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("invalid line number '{line_no}'"),
            );
        }
    };
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status: LineStatus = match errors::parse_param(&body.status) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services
            .orders
            .set_line_status(&id, line_no, status)
            .await
            .map(dto::WorkOrderResponse::from),
    )
}

pub async fn issue<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WorkOrderId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services.orders.issue(&id).await.map(dto::WorkOrderResponse::from),
    )
}
