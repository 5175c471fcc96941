use chat_router_types::TimelineEntry;
use serde::Deserialize;

/// The subset of the hub's `/ws` frame vocabulary this adapter cares
/// about. It only ever acts on `new_message` pushes; `response` and
/// `error` frames are accepted (so parsing never fails on them) but
/// otherwise ignored — this adapter never sends a request frame.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingFrame {
    NewMessage { entry: TimelineEntry },
    Response {
        #[serde(rename = "requestType")]
        request_type: String,
        data: serde_json::Value,
    },
    Error { message: String },
}
