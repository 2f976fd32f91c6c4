use crate::api::handlers::{get_bus_name, get_stoppages, health_check, post_location, reset_trip};
use crate::geofence::GeofenceEngine;
use crate::store::LocationRepository;
use axum::Router;
use axum::routing::{get, post};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone, Debug)]
pub struct AppState {
    repository: Arc<dyn LocationRepository>,
    engine: GeofenceEngine,
}

impl AppState {
    pub fn new(repository: Arc<dyn LocationRepository>, engine: GeofenceEngine) -> Self {
        AppState { repository, engine }
    }

    pub fn repository(&self) -> &dyn LocationRepository {
        self.repository.as_ref()
    }

    pub fn engine(&self) -> &GeofenceEngine {
        &self.engine
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/bus/location", post(post_location))
        .route("/api/route/stoppages/{phone}", get(get_stoppages))
        .route("/api/bus_name/{phone}", get(get_bus_name))
        .route("/api/trip/{route_name}", post(reset_trip))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: impl Future<Output = ()> + Send + 'static) -> std::io::Result<()> {
    info!("🌐 Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await
}
