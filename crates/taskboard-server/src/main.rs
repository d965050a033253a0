use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use taskboard_api::{AppState, AppStateInner};
use taskboard_core::notifier::HttpNotifier;
use taskboard_core::scheduler::{DigestScheduler, SystemClock};
use taskboard_core::session::SessionKeys;
use taskboard_db::Database;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(
        Database::open(&config.db_path)
            .with_context(|| format!("opening database at {}", config.db_path.display()))?,
    );
    let notifier = Arc::new(HttpNotifier::new(&config.dispatcher_url, config.dispatch_timeout)?);
    let keys = SessionKeys::new(&config.jwt_secret, config.access_ttl, config.refresh_ttl);

    let state: AppState = Arc::new(AppStateInner::new(
        db,
        keys,
        notifier,
        config.digest_concurrency,
    ));

    let scheduler = DigestScheduler::new(
        state.digest.clone(),
        config.digest_at,
        Arc::new(SystemClock),
    )
    .start();
    info!("Daily digest scheduled at {} UTC", config.digest_at.at().format("%H:%M"));

    let app = taskboard_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid TASKBOARD_HOST/TASKBOARD_PORT")?;
    let listener = TcpListener::bind(addr).await?;
    info!("Taskboard server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
