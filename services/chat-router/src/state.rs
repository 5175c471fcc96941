use crate::config::Config;
use chat_router_service::Service;
use chat_router_trigger::ExternalTrigger;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared application state handed to every axum handler. Cheap to
/// clone — `Service` and the trigger are themselves `Arc`-backed.
#[derive(Clone)]
pub struct AppState {
    pub service: Service,
    pub trigger: Arc<dyn ExternalTrigger>,
    pub config: Arc<Config>,
    /// Flips to `true` once the daemon starts shutting down. Stream
    /// handlers watch this so an intentional shutdown closes their
    /// sockets instead of waiting on the client to hang up first.
    pub shutdown: watch::Receiver<bool>,
    open_stream_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(
        service: Service,
        trigger: Arc<dyn ExternalTrigger>,
        config: Config,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            service,
            trigger,
            config: Arc::new(config),
            shutdown,
            open_stream_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn stream_connection_opened(&self) -> usize {
        self.open_stream_connections.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn stream_connection_closed(&self) -> usize {
        self.open_stream_connections.fetch_sub(1, Ordering::SeqCst) - 1
    }

    pub fn open_stream_connections(&self) -> usize {
        self.open_stream_connections.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_router_store::Store;
    use chat_router_trigger::NoopTrigger;

    fn state() -> AppState {
        let service = Service::new(Store::open_in_memory().unwrap());
        let (_tx, rx) = watch::channel(false);
        AppState::new(service, Arc::new(NoopTrigger), Config::from_env(), rx)
    }

    #[test]
    fn tracks_open_stream_connection_count() {
        let state = state();
        assert_eq!(state.stream_connection_opened(), 1);
        assert_eq!(state.stream_connection_opened(), 2);
        assert_eq!(state.stream_connection_closed(), 1);
        assert_eq!(state.open_stream_connections(), 1);
    }
}
