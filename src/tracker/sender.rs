use crate::api::wire::LocationRequest;
use crate::domain::PositionSample;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;
use thiserror::Error;
use tracing::{debug, instrument};

/// Delivers a position sample to the server.
#[async_trait]
pub trait LocationSender: Debug + Send + Sync {
    async fn send(&self, sample: &PositionSample) -> Result<(), SendError>;
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Debug)]
pub struct HttpLocationSender {
    client: Client,
    url: String,
}

impl HttpLocationSender {
    pub fn new(client: Client, server_url: &str) -> Self {
        HttpLocationSender {
            client,
            url: format!("{}/api/bus/location", server_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl LocationSender for HttpLocationSender {
    #[instrument(skip_all, fields(bus_name = %sample.vehicle_id))]
    async fn send(&self, sample: &PositionSample) -> Result<(), SendError> {
        let response = self.client.post(&self.url).json(&LocationRequest::from(sample)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Rejected { status, body });
        }

        debug!(status_code = %status, "📡 Sent location ({}, {})", sample.latitude(), sample.longitude());
        Ok(())
    }
}
