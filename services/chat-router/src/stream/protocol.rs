use chat_router_types::{Platform, TimelineEntry};
use serde::{Deserialize, Serialize};

/// A request frame sent by a connected client. Discriminated by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Health,
    Conversations {
        platform: Option<Platform>,
        limit: Option<i64>,
    },
    Timeline {
        platform: Platform,
        #[serde(rename = "platformChatId")]
        platform_chat_id: String,
        after: Option<i64>,
        before: Option<i64>,
        limit: Option<i64>,
    },
    UnifiedTimeline {
        after: Option<i64>,
        before: Option<i64>,
        limit: Option<i64>,
    },
}

impl ClientRequest {
    /// The `type` string as the client sent it, echoed back in the
    /// response frame's `requestType`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ClientRequest::Health => "health",
            ClientRequest::Conversations { .. } => "conversations",
            ClientRequest::Timeline { .. } => "timeline",
            ClientRequest::UnifiedTimeline { .. } => "unified_timeline",
        }
    }
}

/// A frame sent by the server, either in reply to a request or as an
/// unsolicited push of a newly persisted entry.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "response")]
    Response {
        #[serde(rename = "requestType")]
        request_type: &'static str,
        data: serde_json::Value,
    },
    #[serde(rename = "new_message")]
    NewMessage { entry: TimelineEntry },
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerFrame {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ServerFrame always serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_request_parses_with_only_type() {
        let req: ClientRequest = serde_json::from_str(r#"{"type":"health"}"#).unwrap();
        assert_eq!(req.type_name(), "health");
    }

    #[test]
    fn timeline_request_requires_platform_and_chat_id() {
        let req: ClientRequest = serde_json::from_str(
            r#"{"type":"timeline","platform":"discord","platformChatId":"c1","limit":10}"#,
        )
        .unwrap();
        match req {
            ClientRequest::Timeline {
                platform,
                platform_chat_id,
                limit,
                ..
            } => {
                assert_eq!(platform, Platform::Discord);
                assert_eq!(platform_chat_id, "c1");
                assert_eq!(limit, Some(10));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let result: Result<ClientRequest, _> = serde_json::from_str(r#"{"type":"bogus"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn error_frame_serializes_with_type_and_message() {
        let frame = ServerFrame::Error {
            message: "bad frame".into(),
        };
        let json = frame.to_json();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""message":"bad frame""#));
    }
}
