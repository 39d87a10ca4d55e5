//! YaNews - a small news site with comments

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yanews::{
    config::Config,
    db,
    services::{demo_news, UserService},
    web::{self, AppState},
};

/// How often expired sessions are purged
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yanews=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting YaNews...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    db::ping(&pool).await?;
    tracing::info!("Database connected: {}", config.database.url);

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(pool, config)?;

    if std::env::var("YANEWS_SEED_DEMO").map_or(false, |v| v == "1") {
        state.news_service.seed_if_empty(&demo_news()).await?;
    }

    spawn_session_sweep(state.user_service.clone());

    let app = web::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn spawn_session_sweep(user_service: Arc<UserService>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match user_service.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!("Removed {} expired session(s)", removed),
                Err(e) => tracing::warn!("Session cleanup failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
