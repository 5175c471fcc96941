use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use chat_router_service::ServiceError;
use serde::Serialize;

pub type HttpResult<T> = Result<T, Response>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    json_error(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: impl Into<String>) -> Response {
    json_error(StatusCode::NOT_FOUND, message)
}

pub fn internal_error(err: impl std::fmt::Display) -> Response {
    tracing::error!(error = %err, "unhandled internal error");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Maps a [`ServiceError`] to the HTTP error contract: validation
/// failures become 400, everything from the store becomes a logged 500.
pub(crate) fn service_error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::InvalidInput { field, reason } => {
            bad_request(format!("invalid {field}: {reason}"))
        }
        ServiceError::Store(e) => internal_error(e),
    }
}
