use chat_router_outbound::connection::Adapter;
use chat_router_outbound::sink::LoggingSink;
use chat_router_outbound::Config;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(reason) => {
            eprintln!("FATAL: {reason}");
            std::process::exit(1);
        }
    };

    info!(platform = %config.platform, url = %config.ws_url(), "outbound adapter starting");

    // The sink is a logging stand-in here; a real deployment swaps it
    // for a concrete Telegram/Discord/web send-API client (out of
    // scope per spec §1).
    let adapter = Adapter::new(config.platform, config.ws_url(), Arc::new(LoggingSink));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = tokio::spawn(async move { adapter.run(shutdown_rx).await });

    shutdown_signal().await;
    info!("shutting down outbound adapter");
    let _ = shutdown_tx.send(true);
    let _ = run.await;
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
