use crate::stream::protocol::{ClientRequest, ServerFrame};
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chat_router_store::TimelineQuery;
use tracing::{info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut events = state.service.subscribe();
    let mut shutdown = state.shutdown.clone();
    let open_count = state.stream_connection_opened();
    info!(open_connections = open_count, "stream client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let frame = handle_request(&state, &text).await;
                        if socket.send(Message::Text(frame.to_json().into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "stream socket error");
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(entry) => {
                        let frame = ServerFrame::NewMessage { entry };
                        // Best-effort: a failing send here means this
                        // client's socket is gone, not that the
                        // broadcast itself failed.
                        if socket.send(Message::Text(frame.to_json().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "stream client lagged behind event bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            // An intentional daemon shutdown closes every live socket
            // instead of waiting for the client to hang up — axum's own
            // graceful shutdown only stops accepting *new* connections.
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    let remaining = state.stream_connection_closed();
    info!(open_connections = remaining, "stream client disconnected");
}

async fn handle_request(state: &AppState, raw: &str) -> ServerFrame {
    let request: ClientRequest = match serde_json::from_str(raw) {
        Ok(r) => r,
        Err(e) => {
            return ServerFrame::Error {
                message: format!("invalid request: {e}"),
            }
        }
    };

    let request_type = request.type_name();
    let result = dispatch(state, request).await;
    match result {
        Ok(data) => ServerFrame::Response { request_type, data },
        Err(message) => ServerFrame::Error { message },
    }
}

async fn dispatch(state: &AppState, request: ClientRequest) -> Result<serde_json::Value, String> {
    match request {
        ClientRequest::Health => {
            let status = state
                .service
                .health_check()
                .await
                .map_err(|e| e.to_string())?;
            Ok(serde_json::json!({
                "ok": status.ok,
                "messageCount": status.message_count,
                "conversationCount": status.conversation_count,
            }))
        }
        ClientRequest::Conversations { platform, limit } => {
            let conversations = state
                .service
                .list_conversations(platform, limit.unwrap_or(50))
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_value(conversations).map_err(|e| e.to_string())
        }
        ClientRequest::Timeline {
            platform,
            platform_chat_id,
            after,
            before,
            limit,
        } => {
            let query = TimelineQuery {
                after,
                before,
                limit: limit.unwrap_or(50),
            };
            let entries = state
                .service
                .get_timeline(platform, &platform_chat_id, query)
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_value(entries).map_err(|e| e.to_string())
        }
        ClientRequest::UnifiedTimeline {
            after,
            before,
            limit,
        } => {
            let query = TimelineQuery {
                after,
                before,
                limit: limit.unwrap_or(50),
            };
            let entries = state
                .service
                .get_unified_timeline(query)
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_value(entries).map_err(|e| e.to_string())
        }
    }
}
