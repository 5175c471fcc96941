use crate::http::extract::{Path, Query};
use crate::http::response::{internal_error, not_found, HttpResult};
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chat_router_types::Platform;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    platform: Option<Platform>,
    limit: Option<i64>,
}

/// `GET /api/conversations`
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> HttpResult<impl IntoResponse> {
    let conversations = state
        .service
        .list_conversations(params.platform, params.limit.unwrap_or(50))
        .await
        .map_err(internal_error)?;
    Ok(Json(conversations))
}

/// `GET /api/conversations/:platform/:chatId`
pub async fn get_one(
    State(state): State<AppState>,
    Path((platform, chat_id)): Path<(Platform, String)>,
) -> HttpResult<impl IntoResponse> {
    let conversation = state
        .service
        .get_conversation(platform, &chat_id)
        .await
        .map_err(internal_error)?;
    match conversation {
        Some(c) => Ok(Json(c)),
        None => Err(not_found("Conversation not found")),
    }
}
