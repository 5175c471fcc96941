use crate::http::extract::Json as ReqJson;
use crate::http::response::{service_error_response, HttpResult};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chat_router_service::RecordResponseRequest;
use chat_router_trigger::TriggerContext;
use chat_router_types::{InboundMessage, OutboundRequest, TimelineEntry};

/// `POST /api/messages`. Ingests an inbound platform message and, if an
/// external trigger is configured, awaits it before responding — the
/// 201 is held until the trigger completes or fails, never the reverse.
pub async fn ingest(
    State(state): State<AppState>,
    ReqJson(body): ReqJson<InboundMessage>,
) -> HttpResult<impl IntoResponse> {
    let entry = state
        .service
        .ingest_message(body)
        .await
        .map_err(service_error_response)?;

    fire_trigger_if_eligible(&state, &entry).await;

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn fire_trigger_if_eligible(state: &AppState, entry: &TimelineEntry) {
    use chat_router_types::Direction;
    let Some(text) = entry.text.clone() else {
        return;
    };
    if entry.direction != Direction::In {
        return;
    }
    let ctx = TriggerContext {
        self_url: state.config.self_url.clone(),
        platform: entry.platform.as_str().to_string(),
        platform_chat_id: entry.platform_chat_id.clone(),
        entry_id: entry.id,
        text,
    };
    let _ = state.trigger.fire(ctx).await;
}

/// `POST /api/responses`. Records a system-generated reply.
pub async fn record_response(
    State(state): State<AppState>,
    ReqJson(body): ReqJson<OutboundRequest>,
) -> HttpResult<impl IntoResponse> {
    let entry = state
        .service
        .record_response(RecordResponseRequest {
            platform: body.platform,
            platform_chat_id: body.platform_chat_id,
            text: body.text,
            in_reply_to: body.in_reply_to,
        })
        .await
        .map_err(service_error_response)?;
    Ok((StatusCode::CREATED, Json(entry)))
}
