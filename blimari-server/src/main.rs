//! blimari-server - Personalized learning path service
//!
//! Discovers learning content across YouTube, GitHub, web search, and books,
//! curates it with Gemini, and persists the resulting learning paths.
//! Serves the JSON API consumed by the Blimari front end.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use blimari_server::{AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting blimari-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    // Initialize database connection pool and schema
    let db_pool = blimari_server::db::init_database_pool(&config.database_url).await?;
    info!("Database connection established");

    // Sessions orphaned by a previous process run can never progress
    let stale = blimari_server::db::sessions::cleanup_stale_sessions(&db_pool).await?;
    if stale > 0 {
        info!(count = stale, "Marked stale trail sessions as failed");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db_pool, &config)?;
    let app = blimari_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
