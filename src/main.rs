use bus_tracker::api::{self, AppState};
use bus_tracker::app_config::AppConfig;
use bus_tracker::geofence::GeofenceEngine;
use bus_tracker::store::SqliteStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let store = SqliteStore::open(config.database().path())?;
    if let Some(seed_file) = config.database().seed_file() {
        let sql = tokio::fs::read_to_string(seed_file).await?;
        store.seed(&sql).await?;
        info!("✅  Seeded database from '{}'", seed_file);
    }

    let engine = GeofenceEngine::new(config.server().geofence_radius_m());
    let state = AppState::new(Arc::new(store), engine);
    info!(radius_m = engine.radius_m(), "✅  Initialized geofence");

    let listener = TcpListener::bind(config.server().address()).await?;
    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    api::serve(listener, state, async {
        tokio::signal::ctrl_c().await.unwrap_or_else(|e| warn!("⚠️ Unable to listen for shutdown signal: {}", e));
        info!("🛑 Shutting down...");
    })
    .await?;

    Ok(())
}
