use anyhow::Context;
use std::future::Future;
use pagesplit_api::{app, spawn_session_sweeper, AppState, Config};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagesplit_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    info!(
        max_document_bytes = config.max_document_bytes,
        session_ttl_secs = config.session_ttl.as_secs(),
        default_mode = %config.default_mode,
        "Starting pagesplit API v{}",
        env!("CARGO_PKG_VERSION")
    );

    let bind_addr = config.bind_addr;
    let sweep_interval = config.sweep_interval;
    let state = AppState::new(config);
    let sweeper = spawn_session_sweeper(state.store.clone(), sweep_interval);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!("pagesplit API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = wait_for_signal(signal::ctrl_c(), "Ctrl+C");

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Resolve when `listener` sees its signal. A listener that could not be
/// installed never resolves, so it cannot trigger a shutdown.
async fn wait_for_signal<F>(listener: F, name: &str)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = listener.await {
        tracing::error!("failed to install {} handler: {}", name, e);
        std::future::pending::<()>().await;
    }
}
