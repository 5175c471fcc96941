//! Wire and domain types shared by the store, service, and transport
//! adapters of the chat routing hub.
//!
//! Every type here is a plain data value with no behavior beyond
//! (de)serialization — the operations that act on these types live in
//! `chat-router-store` and `chat-router-service`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of chat platforms the hub understands.
///
/// Extension point: adding a platform means adding a variant here and a
/// matching branch wherever an outbound delivery adapter filters by
/// platform. `platformMeta` stays an opaque JSON bag so platform-specific
/// fields never need a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    Discord,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Telegram => "telegram",
            Platform::Discord => "discord",
            Platform::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown platform: {}", self.0)
    }
}

impl std::error::Error for UnknownPlatform {}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "telegram" => Ok(Platform::Telegram),
            "discord" => Ok(Platform::Discord),
            "web" => Ok(Platform::Web),
            other => Err(UnknownPlatform(other.to_owned())),
        }
    }
}

/// Direction of a timeline entry relative to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// A message as reported by a platform adapter, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub platform: Platform,
    pub platform_message_id: String,
    pub platform_chat_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_chat_type: Option<String>,
    pub sender_name: String,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_meta: Option<serde_json::Value>,
}

/// A system-generated reply to be recorded and delivered back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRequest {
    pub platform: Platform,
    pub platform_chat_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<i64>,
}

/// The hub's canonical, persisted form of a message. Returned by every
/// query surface and echoed by every mutation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: i64,
    pub direction: Direction,
    pub platform: Platform,
    pub platform_message_id: String,
    pub platform_chat_id: String,
    pub platform_chat_type: Option<String>,
    pub sender_name: String,
    pub sender_id: String,
    pub text: Option<String>,
    pub timestamp: i64,
    /// Opaque JSON payload, carried as a serialized string per the wire
    /// contract rather than a nested `serde_json::Value` — this mirrors
    /// what actually sits in the `timeline.platform_meta` column.
    pub platform_meta: Option<String>,
    pub created_at: String,
}

/// A (platform, platformChatId) conversation and its running aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i64,
    pub platform: Platform,
    pub platform_chat_id: String,
    pub platform_chat_type: Option<String>,
    pub label: String,
    pub first_seen_at: String,
    pub last_message_at: String,
    pub message_count: i64,
}

/// Response body for the health endpoint / `health` stream request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub message_count: i64,
    pub conversation_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips_through_json_lowercase() {
        for (p, s) in [
            (Platform::Telegram, "\"telegram\""),
            (Platform::Discord, "\"discord\""),
            (Platform::Web, "\"web\""),
        ] {
            assert_eq!(serde_json::to_string(&p).unwrap(), s);
            assert_eq!(serde_json::from_str::<Platform>(s).unwrap(), p);
        }
    }

    #[test]
    fn platform_from_str_rejects_unknown_tags() {
        assert!("mastodon".parse::<Platform>().is_err());
        assert_eq!("telegram".parse::<Platform>().unwrap(), Platform::Telegram);
    }

    #[test]
    fn inbound_message_serializes_with_camel_case_and_omits_absent_optionals() {
        let msg = InboundMessage {
            platform: Platform::Telegram,
            platform_message_id: "m1".into(),
            platform_chat_id: "c1".into(),
            platform_chat_type: None,
            sender_name: "Alice".into(),
            sender_id: "u1".into(),
            text: None,
            timestamp: 1_700_000_000_000,
            platform_meta: None,
        };
        let v: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["platformMessageId"], "m1");
        assert!(v.get("platformChatType").is_none());
        assert!(v.get("text").is_none());
    }

    #[test]
    fn timeline_entry_null_fields_survive_round_trip() {
        let entry = TimelineEntry {
            id: 1,
            direction: Direction::In,
            platform: Platform::Web,
            platform_message_id: "m1".into(),
            platform_chat_id: "c1".into(),
            platform_chat_type: None,
            sender_name: "Alice".into(),
            sender_id: "u1".into(),
            text: None,
            timestamp: 0,
            platform_meta: None,
            created_at: "2026-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: TimelineEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
        assert!(json.contains("\"platformChatType\":null"));
    }
}
