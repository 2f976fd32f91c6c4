mod sqlite;

use crate::domain::{PositionSample, Stop, Stoppage};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub use sqlite::SqliteStore;

#[cfg(test)]
pub(crate) use sqlite::tests::seeded_store;
#[cfg(test)]
pub(crate) use tests::FailingTraceRepository;

/// Persistence used by the ingestion pipeline: the append-only trace, the arrival flags and the
/// read-only catalogue lookups (driver, bus and route).
#[async_trait]
pub trait LocationRepository: Debug + Send + Sync {
    /// Appends a trace row and returns its id.
    async fn append_trace(&self, sample: &PositionSample) -> Result<i64, StoreError>;

    async fn active_route(&self, bus_name: &str) -> Result<Option<String>, StoreError>;

    /// Stops of a route ordered by their ordinal.
    async fn stops_for_route(&self, route_name: &str) -> Result<Vec<Stop>, StoreError>;

    /// Sets the arrival flag if it is not set yet. Returns `true` if this call flipped it.
    async fn mark_arrived(&self, stop_id: i64) -> Result<bool, StoreError>;

    /// Clears every arrival flag of a route, returns the number of stops on the route.
    async fn reset_trip(&self, route_name: &str) -> Result<usize, StoreError>;

    async fn bus_name_for_driver(&self, phone: &str) -> Result<Option<String>, StoreError>;

    async fn stoppages_for_driver(&self, phone: &str) -> Result<Vec<Stoppage>, StoreError>;
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
