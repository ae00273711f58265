//! Serve command - runs the HTTP API

use std::net::SocketAddr;

use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::create_router;
use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::observability::{create_metrics_router, init_metrics};

use super::bootstrap::{self, BootstrapArgs};

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Provision a workspace and root key before accepting requests
    #[arg(long)]
    pub bootstrap: bool,

    #[command(flatten)]
    pub bootstrap_args: BootstrapArgs,
}

/// Run the API server until Ctrl+C or SIGTERM
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    init_logging(&config.logging)?;

    let metrics = init_metrics(&config.metrics);
    let state = crate::create_app_state(&config).await?;

    if args.bootstrap {
        let provisioned = bootstrap::provision(state.storage.as_ref(), &args.bootstrap_args).await?;
        bootstrap::print(&provisioned);
    } else if config.storage.backend.eq_ignore_ascii_case("memory") {
        warn!("In-memory storage without --bootstrap holds no root keys");
    }

    let mut app = create_router(state, config.server.request_timeout());
    if let Some(m) = metrics {
        app = app.merge(create_metrics_router(m, &config.metrics.path));
    }

    let addr = build_socket_addr(&config)?;
    info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_socket_addr() {
        let config = AppConfig::default();
        let addr = build_socket_addr(&config).unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_build_socket_addr_rejects_hostnames() {
        let mut config = AppConfig::default();
        config.server.host = "localhost".to_string();
        assert!(build_socket_addr(&config).is_err());
    }
}
