use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockroom_catalog::{ItemFilter, ItemPatch, NewItem};
use stockroom_core::ItemId;
use stockroom_infra::store::Store;

use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router<S: Store>() -> Router {
    Router::new()
        .route("/", post(create_item::<S>).get(list_items::<S>))
        .route(
            "/:id",
            get(get_item::<S>).put(update_item::<S>).delete(delete_item::<S>),
        )
        .route("/:id/adjust", post(adjust_quantity::<S>))
        .route("/:id/history", get(history::<S>))
}

pub async fn create_item<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> axum::response::Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::CREATED, services.catalog.create_item(new).await)
}

pub async fn list_items<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Query(query): Query<dto::ItemListQuery>,
) -> axum::response::Response {
    let filter = ItemFilter {
        search: query.search,
        category: query.category,
    };
    respond(
        StatusCode::OK,
        services.catalog.list_items(filter).await.map(dto::ListResponse::new),
    )
}

pub async fn get_item<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.catalog.get_item_detail(id).await)
}

pub async fn update_item<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<ItemPatch>, JsonRejection>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.catalog.update_item(id, patch).await)
}

pub async fn delete_item<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalog.delete_item(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}

pub async fn adjust_quantity<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::AdjustQuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services.catalog.adjust_quantity(id, body.delta).await,
    )
}

pub async fn history<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.history.detailed_history_of(id).await)
}

pub async fn categories<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.catalog.categories().await)
}
