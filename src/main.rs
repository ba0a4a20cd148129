use std::path::PathBuf;

use identa::config::Configuration;
use identa::telemetry::{setup_logging, setup_metrics_recorder};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let metrics = match setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(error) => {
            tracing::warn!(%error, "prometheus recorder not installed");
            None
        },
    };

    // read configuration file. let it in memory.
    let path = std::env::var("CONFIG_PATH").map(PathBuf::from).unwrap_or_default();
    let config = Configuration::default().path(path).read();

    let addr = format!("{}:{}", config.address, config.port);
    let state = identa::initialize_state(config, metrics).await?;

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, identa::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(error) => {
                tracing::error!(%error, "failed to install signal handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
}
