//! The optional side-effect fired from the HTTP adapter's inbound-ingest
//! path: telling an external automation job that a new message arrived.
//!
//! Selection between [`NoopTrigger`] and [`AcsTrigger`] happens once at
//! startup based on configuration, not with an `Option<T>` check at
//! every call site — see [`AcsTrigger::from_env`].

use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, warn};

/// Context for a single trigger invocation. Built from the just-ingested
/// entry by the HTTP adapter.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    pub self_url: String,
    pub platform: String,
    pub platform_chat_id: String,
    pub entry_id: i64,
    pub text: String,
}

#[async_trait]
pub trait ExternalTrigger: Send + Sync {
    /// Fires the side effect. Never propagates an error — any failure is
    /// logged internally and reported back as `false`.
    async fn fire(&self, ctx: TriggerContext) -> bool;
}

/// Used when no external-trigger configuration is present. Always
/// returns `false` without making a network call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrigger;

#[async_trait]
impl ExternalTrigger for NoopTrigger {
    async fn fire(&self, _ctx: TriggerContext) -> bool {
        false
    }
}

/// Fires an HTTP POST against an ACS-style job trigger endpoint.
pub struct AcsTrigger {
    client: reqwest::Client,
    base_url: String,
    job_name: String,
}

impl AcsTrigger {
    pub fn new(base_url: impl Into<String>, job_name: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client config is static and always valid");
        Self {
            client,
            base_url: base_url.into(),
            job_name: job_name.into(),
        }
    }

    fn trigger_url(&self) -> String {
        format!(
            "{}/api/jobs/{}/trigger",
            self.base_url.trim_end_matches('/'),
            self.job_name
        )
    }
}

#[async_trait]
impl ExternalTrigger for AcsTrigger {
    async fn fire(&self, ctx: TriggerContext) -> bool {
        let prompt = build_prompt(&ctx);
        let body = serde_json::json!({ "args": format!("-p \"{prompt}\"") });

        let result = self
            .client
            .post(self.trigger_url())
            .json(&body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "external trigger returned non-success status");
                false
            }
            Err(err) => {
                error!(error = %err, "external trigger request failed");
                false
            }
        }
    }
}

/// Builds the single-line prompt string per the fixed `[KEY=value]`
/// prefix format. Inner double quotes are backslash-escaped since the
/// whole prompt is re-embedded in a quoted `-p "..."` argument string.
fn build_prompt(ctx: &TriggerContext) -> String {
    let escaped_text = ctx.text.replace('"', "\\\"");
    format!(
        "[ROUTER={}] [PLATFORM={}] [CHAT_ID={}] [IN_REPLY_TO={}] User message: {}",
        ctx.self_url, ctx.platform, ctx.platform_chat_id, ctx.entry_id, escaped_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_trigger_always_returns_false() {
        let trigger = NoopTrigger;
        let result = trigger
            .fire(TriggerContext {
                self_url: "http://localhost:8080".into(),
                platform: "telegram".into(),
                platform_chat_id: "c1".into(),
                entry_id: 1,
                text: "hi".into(),
            })
            .await;
        assert!(!result);
    }

    #[test]
    fn build_prompt_escapes_inner_quotes() {
        let ctx = TriggerContext {
            self_url: "http://localhost:8080".into(),
            platform: "telegram".into(),
            platform_chat_id: "c1".into(),
            entry_id: 42,
            text: r#"she said "hello""#.into(),
        };
        let prompt = build_prompt(&ctx);
        assert!(prompt.contains(r#"she said \"hello\""#));
        assert!(prompt.starts_with("[ROUTER=http://localhost:8080] [PLATFORM=telegram] [CHAT_ID=c1] [IN_REPLY_TO=42] User message:"));
    }

    #[tokio::test]
    async fn acs_trigger_returns_false_on_connection_failure() {
        let trigger = AcsTrigger::new("http://127.0.0.1:1", "job", Duration::from_millis(200));
        let result = trigger
            .fire(TriggerContext {
                self_url: "http://localhost:8080".into(),
                platform: "telegram".into(),
                platform_chat_id: "c1".into(),
                entry_id: 1,
                text: "hi".into(),
            })
            .await;
        assert!(!result);
    }
}
