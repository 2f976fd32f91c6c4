use crate::domain::{Coordinate, PositionSample, Stop, Stoppage};
use crate::store::{LocationRepository, StoreError};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument};

const SCHEMA: &str = include_str!("schema.sql");

/// SQLite backed [`LocationRepository`]. Statements run on the blocking thread pool, one at a time.
#[derive(Debug)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and makes sure the schema exists.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        info!("💾 Opening database '{}'...", path);
        let connection = if path == ":memory:" { Connection::open_in_memory()? } else { Connection::open(path)? };
        connection.execute_batch(SCHEMA)?;
        info!("💾 Opening database '{}'... OK", path);

        Ok(SqliteStore {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    /// Runs a batch of SQL statements, used to provision the driver, bus and route catalogue.
    pub async fn seed(&self, sql: &str) -> Result<(), StoreError> {
        let sql = sql.to_string();
        self.run(move |connection| connection.execute_batch(&sql)).await
    }

    #[cfg(test)]
    pub async fn trace_count(&self, bus_name: &str) -> Result<i64, StoreError> {
        let bus_name = bus_name.to_string();
        self.run(move |connection| {
            connection.query_row("SELECT COUNT(*) FROM bus_location WHERE bus_name = ?1", params![bus_name], |row| row.get(0))
        })
        .await
    }

    async fn run<T, F>(&self, statement: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let connection = self.connection.clone();
        let result = tokio::task::spawn_blocking(move || {
            // A panicking statement leaves the connection itself usable
            let connection = connection.lock().unwrap_or_else(PoisonError::into_inner);
            statement(&connection)
        })
        .await?;

        Ok(result?)
    }
}

fn stop_from_row(row: &Row<'_>) -> rusqlite::Result<Stop> {
    Ok(Stop {
        id: row.get("id")?,
        route_name: row.get("route_name")?,
        name: row.get("stoppage_name")?,
        ordinal: row.get("stoppage_number")?,
        coordinate: Coordinate {
            latitude: row.get("stoppage_latitude")?,
            longitude: row.get("stoppage_longitude")?,
        },
        arrived: row.get("has_arrived")?,
    })
}

#[async_trait]
impl LocationRepository for SqliteStore {
    #[instrument(skip_all, fields(bus_name = %sample.vehicle_id))]
    async fn append_trace(&self, sample: &PositionSample) -> Result<i64, StoreError> {
        let (bus_name, latitude, longitude) = (sample.vehicle_id.clone(), sample.latitude(), sample.longitude());
        let created_at = sample.captured_at.to_rfc3339();

        let id = self
            .run(move |connection| {
                connection.execute(
                    "INSERT INTO bus_location (bus_name, bus_latitude, bus_longitude, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![bus_name, latitude, longitude, created_at],
                )?;
                Ok(connection.last_insert_rowid())
            })
            .await?;

        debug!(location_id = id, "💾 Appended trace row");
        Ok(id)
    }

    async fn active_route(&self, bus_name: &str) -> Result<Option<String>, StoreError> {
        let bus_name = bus_name.to_string();
        self.run(move |connection| {
            connection
                .query_row("SELECT route FROM bus WHERE bus_name = ?1", params![bus_name], |row| row.get(0))
                .optional()
        })
        .await
    }

    async fn stops_for_route(&self, route_name: &str) -> Result<Vec<Stop>, StoreError> {
        let route_name = route_name.to_string();
        self.run(move |connection| {
            let mut statement = connection.prepare(
                "SELECT id, route_name, stoppage_name, stoppage_latitude, stoppage_longitude, stoppage_number, has_arrived
                 FROM route WHERE route_name = ?1 ORDER BY stoppage_number",
            )?;
            let stops = statement.query_map(params![route_name], stop_from_row)?.collect::<Result<Vec<_>, _>>()?;
            Ok(stops)
        })
        .await
    }

    async fn mark_arrived(&self, stop_id: i64) -> Result<bool, StoreError> {
        let changed = self
            .run(move |connection| {
                connection.execute("UPDATE route SET has_arrived = 1 WHERE id = ?1 AND has_arrived = 0", params![stop_id])
            })
            .await?;
        Ok(changed == 1)
    }

    #[instrument(skip(self))]
    async fn reset_trip(&self, route_name: &str) -> Result<usize, StoreError> {
        let route_name = route_name.to_string();
        self.run(move |connection| connection.execute("UPDATE route SET has_arrived = 0 WHERE route_name = ?1", params![route_name]))
            .await
    }

    async fn bus_name_for_driver(&self, phone: &str) -> Result<Option<String>, StoreError> {
        let phone = phone.to_string();
        self.run(move |connection| {
            connection
                .query_row("SELECT bus_name FROM driver WHERE driver_phone_no = ?1", params![phone], |row| row.get(0))
                .optional()
        })
        .await
    }

    async fn stoppages_for_driver(&self, phone: &str) -> Result<Vec<Stoppage>, StoreError> {
        let phone = phone.to_string();
        self.run(move |connection| {
            let mut statement = connection.prepare(
                "SELECT r.id, r.route_name, r.stoppage_name, r.stoppage_latitude, r.stoppage_longitude, r.stoppage_number, r.has_arrived
                 FROM driver AS d
                 JOIN bus AS b ON d.bus_name = b.bus_name
                 JOIN route AS r ON b.route = r.route_name
                 WHERE d.driver_phone_no = ?1
                 ORDER BY r.stoppage_number",
            )?;
            let stoppages = statement
                .query_map(params![phone], stop_from_row)?
                .map(|stop| stop.map(Stoppage::from))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(stoppages)
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    pub const CATALOGUE: &str = "
        INSERT INTO driver (driver_phone_no, bus_name) VALUES ('9876543210', 'B002');
        INSERT INTO bus (bus_name, route) VALUES ('B002', 'R1');
        INSERT INTO bus (bus_name, route) VALUES ('B404', 'R404');
        INSERT INTO route (id, route_name, stoppage_name, stoppage_latitude, stoppage_longitude, stoppage_number)
        VALUES
            (2, 'R1', 'Ganeshguri', 26.1490, 91.7850, 2),
            (1, 'R1', 'Paltan Bazaar', 26.1840, 91.7400, 1);
    ";

    pub async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().expect("in-memory database");
        store.seed(CATALOGUE).await.expect("seeded catalogue");
        store
    }

    #[tokio::test]
    async fn append_trace_returns_increasing_ids() -> Result<(), StoreError> {
        let store = seeded_store().await;
        let sample = PositionSample::new("B002", Coordinate::new(26.2, 91.8).unwrap());

        let first = store.append_trace(&sample).await?;
        let second = store.append_trace(&sample).await?;

        assert!(second > first);
        assert_eq!(store.trace_count("B002").await?, 2);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_appends_get_distinct_ids() -> Result<(), StoreError> {
        let store = Arc::new(seeded_store().await);

        let tasks = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let sample = PositionSample::new("B002", Coordinate::new(26.2 + f64::from(i) * 0.001, 91.8).unwrap());
                    store.append_trace(&sample).await
                })
            })
            .collect::<Vec<_>>();

        let mut ids = vec![];
        for task in tasks {
            ids.push(task.await.unwrap()?);
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 8);
        assert_eq!(store.trace_count("B002").await?, 8);
        Ok(())
    }

    #[tokio::test]
    async fn stops_are_ordered_by_ordinal() -> Result<(), StoreError> {
        let store = seeded_store().await;

        let stops = store.stops_for_route("R1").await?;

        assert_eq!(stops.iter().map(|stop| stop.name.as_str()).collect::<Vec<_>>(), vec!["Paltan Bazaar", "Ganeshguri"]);
        assert!(stops.iter().all(|stop| !stop.arrived));
        Ok(())
    }

    #[tokio::test]
    async fn active_route_is_none_for_unknown_bus() -> Result<(), StoreError> {
        let store = seeded_store().await;

        assert_eq!(store.active_route("B002").await?, Some("R1".to_string()));
        assert_eq!(store.active_route("B999").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn mark_arrived_flips_the_flag_only_once() -> Result<(), StoreError> {
        let store = seeded_store().await;

        assert!(store.mark_arrived(1).await?);
        assert!(!store.mark_arrived(1).await?);

        let stops = store.stops_for_route("R1").await?;
        assert!(stops[0].arrived);
        assert!(!stops[1].arrived);
        Ok(())
    }

    #[tokio::test]
    async fn reset_trip_clears_all_flags_of_the_route() -> Result<(), StoreError> {
        let store = seeded_store().await;
        store.mark_arrived(1).await?;
        store.mark_arrived(2).await?;

        let reset = store.reset_trip("R1").await?;

        assert_eq!(reset, 2);
        assert!(store.stops_for_route("R1").await?.iter().all(|stop| !stop.arrived));
        assert_eq!(store.reset_trip("R404").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn looks_up_the_driver_catalogue() -> Result<(), StoreError> {
        let store = seeded_store().await;

        assert_eq!(store.bus_name_for_driver("9876543210").await?, Some("B002".to_string()));
        assert_eq!(store.bus_name_for_driver("0000000000").await?, None);

        let stoppages = store.stoppages_for_driver("9876543210").await?;
        assert_eq!(
            stoppages[0],
            Stoppage {
                route_name: "R1".to_string(),
                stoppage_name: "Paltan Bazaar".to_string(),
                stoppage_latitude: 26.1840,
                stoppage_longitude: 91.7400,
                stoppage_number: 1,
                has_arrived: false,
            }
        );
        assert_eq!(stoppages.len(), 2);
        assert!(store.stoppages_for_driver("0000000000").await?.is_empty());
        Ok(())
    }
}
