pub mod conversations;
pub mod extract;
pub mod health;
pub mod messages;
pub mod response;
pub mod timeline;

use crate::state::AppState;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the `/api` surface, state still unbound. The websocket route
/// is mounted separately by [`crate::stream`] onto the same router
/// before the caller attaches state and middleware — matching how the
/// stream protocol is documented apart from the request/response
/// endpoints but still lives behind one listening socket.
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/messages", post(messages::ingest))
        .route("/api/responses", post(messages::record_response))
        .route(
            "/api/timeline/:platform/:chatId",
            get(timeline::per_conversation),
        )
        .route("/api/timeline", get(timeline::unified))
        .route("/api/conversations", get(conversations::list))
        .route(
            "/api/conversations/:platform/:chatId",
            get(conversations::get_one),
        )
        .route("/api/health", get(health::health))
        .fallback(fallback_404)
}

pub fn with_middleware(router: Router<AppState>) -> Router<AppState> {
    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn fallback_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
