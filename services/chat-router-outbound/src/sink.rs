use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("platform send failed: {0}")]
    Send(String),
}

/// Abstraction over the concrete platform send API (Telegram, Discord,
/// the web UI's own push channel, ...). The concrete implementation is
/// out of scope here — it's owned by whatever process wires this
/// adapter up for a specific platform.
#[async_trait]
pub trait PlatformSink: Send + Sync {
    async fn send(&self, chat_id: &str, chunk: &str) -> Result<(), SinkError>;
}

/// Stand-in implementation that just logs what it would have sent.
/// Useful as the default wiring and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl PlatformSink for LoggingSink {
    async fn send(&self, chat_id: &str, chunk: &str) -> Result<(), SinkError> {
        tracing::info!(chat_id, chunk_len = chunk.chars().count(), "would deliver chunk");
        Ok(())
    }
}
