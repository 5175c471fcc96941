//! Business-logic layer sitting between the transport adapters and the
//! store: validation, normalization, synthetic-id minting for recorded
//! responses, and a broadcast event bus of newly persisted entries.

use chat_router_store::{NewEntry, Store, StoreError, StoreResult, TimelineQuery};
use chat_router_types::{Conversation, Direction, InboundMessage, Platform, TimelineEntry};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone)]
pub struct RecordResponseRequest {
    pub platform: Platform,
    pub platform_chat_id: String,
    pub text: String,
    pub in_reply_to: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct HealthStatus {
    pub ok: bool,
    pub message_count: i64,
    pub conversation_count: i64,
}

/// The authoritative business-logic layer. Cheap to clone — every clone
/// shares the same store, counter, and event bus.
#[derive(Clone)]
pub struct Service {
    store: Arc<Mutex<Store>>,
    next_synthetic_id: Arc<AtomicI64>,
    events: broadcast::Sender<TimelineEntry>,
}

impl Service {
    pub fn new(store: Store) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            store: Arc::new(Mutex::new(store)),
            next_synthetic_id: Arc::new(AtomicI64::new(1)),
            events,
        }
    }

    /// Subscribe to the `message:new` event stream. Every entry
    /// successfully ingested by this service instance — inbound or
    /// recorded response — is published here exactly once, in id order.
    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEntry> {
        self.events.subscribe()
    }

    pub async fn ingest_message(&self, msg: InboundMessage) -> ServiceResult<TimelineEntry> {
        require_non_empty("senderName", &msg.sender_name)?;
        require_non_empty("senderId", &msg.sender_id)?;
        require_non_empty("platformMessageId", &msg.platform_message_id)?;
        require_non_empty("platformChatId", &msg.platform_chat_id)?;

        let platform_meta = msg
            .platform_meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ServiceError::InvalidInput {
                field: "platformMeta".into(),
                reason: e.to_string(),
            })?;

        let entry = NewEntry {
            direction: Direction::In,
            platform: msg.platform,
            platform_message_id: msg.platform_message_id,
            platform_chat_id: msg.platform_chat_id,
            platform_chat_type: msg.platform_chat_type,
            sender_name: msg.sender_name.clone(),
            sender_id: msg.sender_id,
            text: msg.text,
            timestamp: msg.timestamp,
            platform_meta,
        };

        let stored = {
            let mut store = self.store.lock().await;
            store.ingest(entry, &msg.sender_name)?
        };
        self.publish(stored.clone());
        Ok(stored)
    }

    /// Records a system-generated reply. Per the defined (if surprising)
    /// contract: the conversation's label is always overwritten to
    /// `"System"`, even for a conversation that already has a
    /// human-readable label from its inbound messages.
    pub async fn record_response(
        &self,
        req: RecordResponseRequest,
    ) -> ServiceResult<TimelineEntry> {
        require_non_empty("platformChatId", &req.platform_chat_id)?;
        require_non_empty("text", &req.text)?;

        let synthetic_id = self.next_synthetic_id.fetch_add(1, Ordering::SeqCst);
        let platform_meta = req
            .in_reply_to
            .map(|id| serde_json::json!({ "inReplyTo": id }).to_string());

        let entry = NewEntry {
            direction: Direction::Out,
            platform: req.platform,
            platform_message_id: format!("router-{synthetic_id}"),
            platform_chat_id: req.platform_chat_id,
            platform_chat_type: None,
            sender_name: "System".into(),
            sender_id: "system".into(),
            text: Some(req.text),
            timestamp: now_millis(),
            platform_meta,
        };

        let stored = {
            let mut store = self.store.lock().await;
            store.ingest(entry, "System")?
        };
        self.publish(stored.clone());
        Ok(stored)
    }

    pub async fn get_timeline(
        &self,
        platform: Platform,
        chat_id: &str,
        query: TimelineQuery,
    ) -> StoreResult<Vec<TimelineEntry>> {
        self.store.lock().await.get_timeline(platform, chat_id, query)
    }

    pub async fn get_unified_timeline(
        &self,
        query: TimelineQuery,
    ) -> StoreResult<Vec<TimelineEntry>> {
        self.store.lock().await.get_unified_timeline(query)
    }

    pub async fn list_conversations(
        &self,
        platform: Option<Platform>,
        limit: i64,
    ) -> StoreResult<Vec<Conversation>> {
        self.store.lock().await.list_conversations(platform, limit)
    }

    pub async fn get_conversation(
        &self,
        platform: Platform,
        chat_id: &str,
    ) -> StoreResult<Option<Conversation>> {
        self.store.lock().await.get_conversation(platform, chat_id)
    }

    pub async fn health_check(&self) -> StoreResult<HealthStatus> {
        let stats = self.store.lock().await.get_stats()?;
        Ok(HealthStatus {
            ok: true,
            message_count: stats.message_count,
            conversation_count: stats.conversation_count,
        })
    }

    /// Releases the backing store. Called once, after the listening
    /// socket and its connections have shut down, as the last step of
    /// the daemon's shutdown sequence — any later call into the service
    /// surfaces the store's close-after-use error rather than panicking.
    pub async fn close_store(&self) {
        self.store.lock().await.close();
    }

    fn publish(&self, entry: TimelineEntry) {
        // No subscribers is the common case when no stream clients are
        // connected; that's not an error, just nobody listening.
        let _ = self.events.send(entry);
    }
}

fn require_non_empty(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput {
            field: field.into(),
            reason: "must be a non-empty string".into(),
        });
    }
    Ok(())
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_router_store::Store;

    fn service() -> Service {
        Service::new(Store::open_in_memory().unwrap())
    }

    fn inbound(chat_id: &str) -> InboundMessage {
        InboundMessage {
            platform: Platform::Telegram,
            platform_message_id: "m1".into(),
            platform_chat_id: chat_id.into(),
            platform_chat_type: Some("private".into()),
            sender_name: "Alice".into(),
            sender_id: "u1".into(),
            text: Some("hi".into()),
            timestamp: 1000,
            platform_meta: None,
        }
    }

    #[tokio::test]
    async fn ingest_message_rejects_empty_sender_name() {
        let svc = service();
        let mut msg = inbound("c1");
        msg.sender_name = "".into();
        let err = svc.ingest_message(msg).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput { field, .. } if field == "senderName"));
    }

    #[tokio::test]
    async fn ingest_message_allows_zero_timestamp() {
        let svc = service();
        let mut msg = inbound("c1");
        msg.timestamp = 0;
        let entry = svc.ingest_message(msg).await.unwrap();
        assert_eq!(entry.timestamp, 0);
    }

    #[tokio::test]
    async fn ingest_message_publishes_to_subscribers() {
        let svc = service();
        let mut rx = svc.subscribe();
        let entry = svc.ingest_message(inbound("c1")).await.unwrap();
        let published = rx.recv().await.unwrap();
        assert_eq!(published.id, entry.id);
    }

    #[tokio::test]
    async fn record_response_mints_sequential_router_ids() {
        let svc = service();
        let req = |chat: &str| RecordResponseRequest {
            platform: Platform::Telegram,
            platform_chat_id: chat.into(),
            text: "reply".into(),
            in_reply_to: None,
        };
        let first = svc.record_response(req("c1")).await.unwrap();
        let second = svc.record_response(req("c1")).await.unwrap();
        assert_eq!(first.platform_message_id, "router-1");
        assert_eq!(second.platform_message_id, "router-2");
    }

    #[tokio::test]
    async fn record_response_overwrites_conversation_label_to_system() {
        let svc = service();
        svc.ingest_message(inbound("c1")).await.unwrap();
        svc.record_response(RecordResponseRequest {
            platform: Platform::Telegram,
            platform_chat_id: "c1".into(),
            text: "reply".into(),
            in_reply_to: None,
        })
        .await
        .unwrap();
        let conv = svc
            .get_conversation(Platform::Telegram, "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conv.label, "System");
    }

    #[tokio::test]
    async fn record_response_rejects_empty_text() {
        let svc = service();
        let err = svc
            .record_response(RecordResponseRequest {
                platform: Platform::Telegram,
                platform_chat_id: "c1".into(),
                text: "".into(),
                in_reply_to: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput { field, .. } if field == "text"));
    }

    #[tokio::test]
    async fn health_check_reflects_store_stats() {
        let svc = service();
        svc.ingest_message(inbound("c1")).await.unwrap();
        let health = svc.health_check().await.unwrap();
        assert!(health.ok);
        assert_eq!(health.message_count, 1);
        assert_eq!(health.conversation_count, 1);
    }

    #[tokio::test]
    async fn close_store_fails_subsequent_calls_loudly() {
        let svc = service();
        svc.close_store().await;
        let err = svc.ingest_message(inbound("c1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::PoisonedAfterClose)));
    }
}
