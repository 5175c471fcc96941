use crate::http::extract::{Path, Query};
use crate::http::response::{internal_error, HttpResult};
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chat_router_store::TimelineQuery;
use chat_router_types::Platform;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct TimelineParams {
    after: Option<i64>,
    before: Option<i64>,
    limit: Option<i64>,
}

impl From<TimelineParams> for TimelineQuery {
    fn from(p: TimelineParams) -> Self {
        TimelineQuery {
            after: p.after,
            before: p.before,
            limit: p.limit.unwrap_or(50),
        }
    }
}

/// `GET /api/timeline/:platform/:chatId`
pub async fn per_conversation(
    State(state): State<AppState>,
    Path((platform, chat_id)): Path<(Platform, String)>,
    Query(params): Query<TimelineParams>,
) -> HttpResult<impl IntoResponse> {
    let entries = state
        .service
        .get_timeline(platform, &chat_id, params.into())
        .await
        .map_err(internal_error)?;
    Ok(Json(entries))
}

/// `GET /api/timeline`
pub async fn unified(
    State(state): State<AppState>,
    Query(params): Query<TimelineParams>,
) -> HttpResult<impl IntoResponse> {
    let entries = state
        .service
        .get_unified_timeline(params.into())
        .await
        .map_err(internal_error)?;
    Ok(Json(entries))
}
