//! Folio Server - Main Entry Point

use std::env;
use std::net::SocketAddr;

use anyhow::Result;
use tracing::{info, warn};

use folio_server::observability::{self, LogFormat};
use folio_server::{api, config, db, users};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    observability::init(
        LogFormat::parse(env::var("LOG_FORMAT").ok().as_deref()),
        env::var("LOG_LEVEL").ok().as_deref(),
    );

    // Load configuration
    let config = config::Config::from_env()?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Folio Server");

    // Initialize database
    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;

    if let Some(admin) = &config.bootstrap_admin {
        match users::bootstrap::ensure_admin(&db_pool, admin).await? {
            Some(user_id) => info!(user_id, "Bootstrap administrator ready"),
            None => info!("Users already exist; skipping bootstrap administrator"),
        }
    }

    if config.has_ip_allow_list() {
        info!(entries = config.allowed_ips.len(), "IP allow-list enabled");
    }

    let bind_address = config.bind_address.clone();

    // Build application state and router
    let state = api::AppState::new(db_pool, config);
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal, cleaning up..."),
            Err(e) => {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        }
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    info!("Server shutdown complete");

    Ok(())
}
