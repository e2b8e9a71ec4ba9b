use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use stockroom_catalog::NewLocation;
use stockroom_core::LocationId;
use stockroom_infra::store::Store;

use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router<S: Store>() -> Router {
    Router::new()
        .route("/", post(create_location::<S>).get(list_locations::<S>))
        .route("/:id", get(get_location::<S>))
}

pub async fn create_location<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    payload: Result<Json<NewLocation>, JsonRejection>,
) -> axum::response::Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::CREATED, services.catalog.create_location(new).await)
}

pub async fn list_locations<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
) -> axum::response::Response {
    respond(
        StatusCode::OK,
        services.catalog.list_locations().await.map(dto::ListResponse::new),
    )
}

pub async fn get_location<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: LocationId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.catalog.get_location(id).await)
}
