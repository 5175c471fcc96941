use crate::http::response::{internal_error, HttpResult};
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chat_router_types::HealthStatus;

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> HttpResult<impl IntoResponse> {
    let status = state.service.health_check().await.map_err(internal_error)?;
    Ok(Json(HealthStatus {
        ok: status.ok,
        message_count: status.message_count,
        conversation_count: status.conversation_count,
    }))
}
