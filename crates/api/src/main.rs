//! API server entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use api::auth::TokenAuthority;
use api::config::{Config, ConfigError, StoreBackend};
use api::state::AppState;
use clap::Parser;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use store::{DocumentStore, InMemoryStore, PostgresStore, StoreError};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use tracing_subscriber::util::TryInitError;

#[derive(Debug, Parser)]
#[command(name = "api", about = "Online ordering system HTTP server")]
struct Cli {
    /// TOML configuration file; environment variables override its values.
    #[arg(short, long, env = "OOS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Telemetry(#[from] TryInitError),

    #[error("metrics recorder: {0}")]
    Metrics(#[from] BuildError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("server I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Serves until a shutdown signal, then lets in-flight requests finish
/// within the grace period before aborting the server task.
async fn serve<S: DocumentStore>(
    config: &Config,
    store: S,
    metrics_handle: PrometheusHandle,
) -> Result<(), StartupError> {
    let tokens = TokenAuthority::new(&config.auth);
    let state = Arc::new(AppState::new(store, tokens, config.request_timeout()));
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "starting API server");

    let stop = Arc::new(Notify::new());
    let server_stop = stop.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_stop.notified().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    stop.notify_one();
    let grace = config.shutdown_grace();
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(?grace, "grace period elapsed, aborting open connections");
            server.abort();
        }
    }

    tracing::info!("server shut down");
    Ok(())
}

async fn run(config: Config) -> Result<(), StartupError> {
    let metrics_handle = PrometheusBuilder::new().install_recorder()?;
    api::routes::metrics::describe();

    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory store");
            serve(&config, InMemoryStore::new(), metrics_handle).await
        }
        StoreBackend::Postgres => {
            let url = config
                .store
                .url
                .as_deref()
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            let store = PostgresStore::connect(url, config.store.max_connections).await?;
            store.run_migrations().await?;
            tracing::info!("connected to postgres, migrations applied");
            serve(&config, store, metrics_handle).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Held until exit so the file writer flushes.
    let _guard = match api::telemetry::init(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialise logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
