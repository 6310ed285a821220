//! stagegated - session-gated stage progression over HTTP

use anyhow::Context;
use clap::Parser;
use stagegate_core::StorageConfig;
use stagegate_service::config::ServiceConfig;
use stagegate_service::{build_router, ServiceState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "stagegated")]
#[command(about = "Session-gated multi-stage content service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "STAGEGATE_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configured one
    #[arg(short, long, env = "STAGEGATE_LISTEN_ADDR")]
    listen: Option<SocketAddr>,

    /// Log filter, overrides the configured one
    #[arg(long, env = "STAGEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "STAGEGATE_LOG_JSON")]
    json: bool,

    /// PostgreSQL url; selects postgres storage over the configured backend
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Max PostgreSQL pool connections when --database-url is given
    #[arg(long, default_value_t = 5, env = "STAGEGATE_PG_MAX_CONNECTIONS")]
    pg_max_connections: u32,

    /// Production mode: secure cookies, session secret required
    #[arg(long, env = "STAGEGATE_PRODUCTION")]
    production: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        ServiceConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(url) = cli.database_url {
        config.storage = StorageConfig::postgres(url, cli.pg_max_connections);
    }
    config.logging.json |= cli.json;
    config.server.production |= cli.production;

    init_tracing(&config);

    let state = ServiceState::bootstrap(&config)
        .await
        .context("failed to start stage gate")?;

    let sessions = Arc::clone(&state.sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sessions.prune();
            if removed > 0 {
                debug!(removed, remaining = sessions.len(), "pruned idle sessions");
            }
        }
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;
    info!(addr = %listener.local_addr()?, "stagegated listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("stagegated shut down");
    Ok(())
}

fn init_tracing(config: &ServiceConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}
