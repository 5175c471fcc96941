use chat_router::{cli, config::Config, http, state::AppState, stream};
use chat_router_service::Service;
use chat_router_store::Store;
use chat_router_trigger::{AcsTrigger, ExternalTrigger, NoopTrigger};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env();

    if cli::is_cli_invocation(&args) {
        return cli::run(&config.router_url, &args).await;
    }

    match run_daemon(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(reason) => {
            tracing::error!(error = %reason, "startup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_daemon(config: Config) -> Result<(), String> {
    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| format!("failed to create data directory: {e}"))?;

    let store = Store::open(&config.database_path())
        .map_err(|e| format!("failed to open store: {e}"))?;
    let service = Service::new(store);

    let trigger: Arc<dyn ExternalTrigger> = match &config.acs_job_name {
        Some(job_name) => Arc::new(AcsTrigger::new(
            config.acs_url.clone(),
            job_name.clone(),
            config.acs_timeout,
        )),
        None => Arc::new(NoopTrigger),
    };

    let bind_addr = config.bind_addr();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app_state = AppState::new(service.clone(), trigger, config, shutdown_rx);

    let router = stream::mount(http::build_api_router());
    let router = http::with_middleware(router).with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("failed to bind {bind_addr}: {e}"))?;
    info!(addr = %bind_addr, "chat-router listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .map_err(|e| format!("server error: {e}"))?;

    // Stream clients were told to close themselves as soon as the
    // signal fired (see `shutdown_signal`); the store closes last.
    service.close_store().await;
    info!("chat-router shut down gracefully");
    Ok(())
}

/// Waits for SIGTERM or Ctrl-C (SIGINT), flips the shared shutdown flag
/// so every open stream socket closes itself, and returns to let
/// `with_graceful_shutdown` stop accepting new HTTP connections and
/// drain whatever's left in flight.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
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
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }

    let _ = shutdown_tx.send(true);
}
