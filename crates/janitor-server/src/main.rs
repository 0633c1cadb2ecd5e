mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use janitor_api::commands::Commands;
use janitor_api::{AppState, AppStateInner, notices};
use janitor_db::{Database, DbPlatform};
use janitor_purge::{PurgeExecutor, RetentionScheduler};
use janitor_store::PolicyStore;
use janitor_types::events::PlatformEvent;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "janitor=debug,janitor_purge=info,tower_http=debug".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    // Chat database and policy file
    let db = Arc::new(Database::open(&config.db_path)?);
    let platform = Arc::new(DbPlatform::new(db, config.service_user, config.link_base.clone()));
    let store = Arc::new(PolicyStore::open(&config.policy_path)?);
    info!("Loaded policies from {}", store.path().display());

    let executor = PurgeExecutor::new(platform, store);

    // Scheduled clean-up
    let shutdown = CancellationToken::new();
    let scheduler = RetentionScheduler::new(executor.clone(), config.cleanup_times.clone());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.clone()));

    let state: AppState = Arc::new(AppStateInner {
        commands: Commands::new(executor.clone()),
        jwt_secret: config.jwt_secret.clone(),
    });

    let app = janitor_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Janitor listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    notices::handle_event(&executor, PlatformEvent::Ready).await;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    scheduler_task.await?;
    notices::handle_event(&executor, PlatformEvent::Disconnected).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
