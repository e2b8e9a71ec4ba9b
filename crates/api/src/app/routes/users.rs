use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use stockroom_catalog::NewUser;
use stockroom_core::UserId;
use stockroom_infra::store::Store;

use crate::app::errors;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;

pub fn router<S: Store>() -> Router {
    Router::new()
        .route("/", post(create_user::<S>))
        .route("/:id", get(get_user::<S>))
}

/// The password hash is never echoed back (`User` skips it when serializing).
pub async fn create_user<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> axum::response::Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::CREATED, services.catalog.create_user(new).await)
}

pub async fn get_user<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_param(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.catalog.get_user(id).await)
}
