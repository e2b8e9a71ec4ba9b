use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use stockroom_core::CoreResult;

use crate::app::errors;

/// Serialize a successful result with `status`, or map the error to its JSON response.
pub fn respond<T: Serialize>(status: StatusCode, result: CoreResult<T>) -> axum::response::Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => errors::core_error_to_response(e),
    }
}
