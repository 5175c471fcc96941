pub mod protocol;
mod ws;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;

pub fn mount(router: Router<AppState>) -> Router<AppState> {
    router.route("/ws", get(ws::ws_handler))
}
