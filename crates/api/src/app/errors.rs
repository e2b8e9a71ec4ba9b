use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use stockroom_core::{CoreError, ErrorKind};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn core_error_to_response(err: CoreError) -> axum::response::Response {
    let kind = err.kind();
    if kind == ErrorKind::Store {
        tracing::error!(error = %err, "store failure");
    }
    json_error(status_for(kind), kind.as_str(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Unwrap a JSON body, answering malformed payloads with a 400 in the usual error shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(json_error(
            StatusCode::BAD_REQUEST,
            ErrorKind::Validation.as_str(),
            rejection.body_text(),
        )),
    }
}

/// Parse a path, query or body parameter; malformed values are a 400.
pub fn parse_param<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = CoreError>,
{
    raw.parse().map_err(core_error_to_response)
}
