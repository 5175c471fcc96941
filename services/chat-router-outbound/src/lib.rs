//! Platform-side outbound delivery adapter: connects to the hub's
//! streaming endpoint, filters pushes for one platform, chunks text, and
//! hands each chunk to a [`sink::PlatformSink`].
//!
//! The concrete platform send API is out of scope (see spec §1); this
//! crate only owns the connection lifecycle, the filter predicate, and
//! the chunking algorithm described in spec §4.6.

pub mod chunking;
pub mod connection;
pub mod protocol;
pub mod sink;

use chat_router_types::Platform;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub platform: Platform,
    pub router_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let platform = std::env::var("CHAT_ROUTER_OUTBOUND_PLATFORM")
            .map_err(|_| "CHAT_ROUTER_OUTBOUND_PLATFORM must be set".to_string())?
            .parse::<Platform>()
            .map_err(|e| e.to_string())?;
        let router_url = std::env::var("CHAT_ROUTER_URL")
            .unwrap_or_else(|_| "http://localhost:3100".to_string());
        Ok(Self { platform, router_url })
    }

    /// The `/ws` URL to connect to, derived from the HTTP base URL.
    pub fn ws_url(&self) -> String {
        let base = self.router_url.trim_end_matches('/');
        let ws_base = base
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        format!("{ws_base}/ws")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_swaps_http_scheme_for_ws() {
        let cfg = Config {
            platform: Platform::Telegram,
            router_url: "http://localhost:3100".into(),
        };
        assert_eq!(cfg.ws_url(), "ws://localhost:3100/ws");
    }

    #[test]
    fn ws_url_swaps_https_scheme_for_wss() {
        let cfg = Config {
            platform: Platform::Discord,
            router_url: "https://hub.example.com/".into(),
        };
        assert_eq!(cfg.ws_url(), "wss://hub.example.com/ws");
    }
}
