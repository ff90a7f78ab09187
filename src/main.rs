use mimalloc::MiMalloc;
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rollcall::db::JournalStorage;
use rollcall::router::{RollcallState, rollcall_router};
use rollcall::service::token::TokenService;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = rollcall::config::Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    if cfg.jwt_secret == rollcall::config::DEV_JWT_SECRET {
        warn!("running with the built-in development JWT secret; set ROLLCALL_JWT_SECRET");
    }
    info!(
        listen_addr = %cfg.listen_addr,
        database_url = %cfg.database_url,
        loglevel = %cfg.loglevel,
        static_dir = %cfg.static_dir
    );

    let pool = rollcall::db::connect(&cfg.database_url).await?;
    let storage = JournalStorage::new(pool);
    storage.init_schema().await?;

    let tokens = TokenService::new(&cfg.jwt_secret, cfg.token_ttl_hours);
    let state = RollcallState::new(storage, tokens);

    let static_dir = Path::new(&cfg.static_dir);
    let app = rollcall_router(state).fallback_service(
        ServeDir::new(static_dir).not_found_service(ServeFile::new(static_dir.join("index.html"))),
    );

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install shutdown signal handler");
    }
}
