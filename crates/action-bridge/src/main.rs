//! Action Bridge Server
//!
//! Serves the IDE command bridge API on a local-only listener, executing
//! commands, chains and conditionals against the configured host.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use action_bridge::{
    config::AppConfig,
    history::{spawn_persister, HistoryStore},
    host::InMemoryHost,
    result_ext::OptionResultExt,
    router::build_router,
    state::AppState,
};

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,action_bridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the host: a YAML profile when configured, otherwise an empty host.
fn load_host(config: &AppConfig) -> anyhow::Result<Arc<InMemoryHost>> {
    let host = match &config.host_profile {
        Some(path) => InMemoryHost::load(path)?,
        None => {
            tracing::warn!("No host profile configured, serving an empty command registry");
            InMemoryHost::new()
        }
    };
    Ok(Arc::new(host))
}

/// Open the history store, loading any persisted snapshot.
fn open_history(config: &AppConfig) -> Arc<HistoryStore> {
    let files = config
        .history_files()
        .log_none("No home directory found, history will not be persisted");
    let store = match files {
        Some(files) => HistoryStore::open(files),
        None => HistoryStore::in_memory(),
    };
    Arc::new(store.with_max_entries(config.max_history))
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Action Bridge"
    );

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load app config, using defaults");
        AppConfig::default()
    });

    tracing::info!(
        host = %config.host,
        port = config.port,
        persist_interval_secs = config.persist_interval_secs,
        "Configuration loaded"
    );

    // Engine calls block on the UI thread, so the blocking pool is the
    // request worker pool.
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = config.blocking_threads {
        builder.max_blocking_threads(threads.max(1));
    }
    let runtime = builder.build()?;

    runtime.block_on(serve(config))
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let host = load_host(&config)?;
    let history = open_history(&config);
    let persister = spawn_persister(Arc::clone(&history), config.persist_interval());

    let addr: SocketAddr = config.bind_address().parse()?;
    let state = AppState::for_host(config, host, Arc::clone(&history))?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    persister.abort();
    tokio::task::spawn_blocking(move || history.persist()).await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
