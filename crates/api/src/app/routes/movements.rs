use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};

use stockroom_infra::services::RelocateRequest;
use stockroom_infra::store::Store;

use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `POST /move`: relocate an item and return the recorded movement.
pub async fn relocate<S: Store>(
    Extension(services): Extension<Arc<AppServices<S>>>,
    payload: Result<Json<dto::MoveRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let req = match (
        errors::parse_param(&body.item_id),
        errors::parse_param(&body.to_location_id),
        errors::parse_param(&body.user_id),
    ) {
        (Ok(item_id), Ok(to_location_id), Ok(user_id)) => RelocateRequest {
            item_id,
            to_location_id,
            user_id,
            note: body.note,
        },
        (Err(resp), _, _) | (_, Err(resp), _) | (_, _, Err(resp)) => return resp,
    };
    respond(StatusCode::CREATED, services.ledger.relocate(req).await)
}
