use crate::api::wire::BusNameResponse;
use crate::app_config::Tracker;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no bus assigned to driver '{0}'")]
    DriverNotFound(String),
}

/// Resolves the bus driven by `phone`. Network and server errors are retried with exponential backoff, an
/// unknown driver is not.
#[instrument(skip(client, config))]
pub async fn resolve_bus_name(client: &Client, config: &Tracker, phone: &str) -> Result<String, LookupError> {
    let strategy = ExponentialBackoff::from_millis(config.lookup_retry_ms())
        .factor(2)
        .max_delay(config.lookup_retry_max_delay())
        .map(jitter)
        .take(5);

    info!("🔎 Resolving bus for driver '{}'...", phone);
    let bus_name = Retry::spawn(strategy, || fetch_bus_name(client, config.server_url(), phone))
        .await?
        .ok_or_else(|| LookupError::DriverNotFound(phone.to_string()))?;
    info!("🔎 Resolving bus for driver '{}'... OK, driving '{}'", phone, bus_name);

    Ok(bus_name)
}

async fn fetch_bus_name(client: &Client, server_url: &str, phone: &str) -> Result<Option<String>, reqwest::Error> {
    request_bus_name(client, server_url, phone)
        .await
        .inspect_err(|e| warn!("⚠️ Bus lookup failed: {}. Retrying...", e))
}

/// Looks up the bus once. An unknown driver is a successful lookup without a bus.
async fn request_bus_name(client: &Client, server_url: &str, phone: &str) -> Result<Option<String>, reqwest::Error> {
    let response = client
        .get(format!("{}/api/bus_name/{}", server_url.trim_end_matches('/'), phone))
        .send()
        .await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let body = response.error_for_status()?.json::<BusNameResponse>().await?;
    Ok(Some(body.bus_name))
}
