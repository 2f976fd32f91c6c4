use bus_tracker::app_config::AppConfig;
use bus_tracker::tracker::identity::resolve_bus_name;
use bus_tracker::tracker::source::read_positions;
use bus_tracker::tracker::{Dispatcher, HttpLocationSender, SignificanceFilter};
use reqwest::Client;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("🪵 Starting tracker v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    let tracker = config.tracker();
    info!("✅  Loaded configuration");

    let client = Client::new();
    let bus_name = match (tracker.bus_name(), tracker.driver_phone()) {
        (Some(bus_name), _) => bus_name.to_string(),
        (None, Some(phone)) => resolve_bus_name(&client, tracker, phone).await?,
        (None, None) => return Err("configure either tracker.bus_name or tracker.driver_phone".into()),
    };

    let sender = HttpLocationSender::new(client, tracker.server_url());
    let filter = SignificanceFilter::new(tracker.significance_threshold_deg());
    let (samples_tx, samples_rx) = mpsc::channel(tracker.sample_buffer_size());
    let dispatcher = Dispatcher::new(Arc::new(sender), filter, tracker.tick_interval()).spawn(samples_rx);
    info!("✅  Initialized dispatcher");

    info!("🔥 Tracking bus '{}', reading 'latitude,longitude' lines from stdin", bus_name);
    let reader = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = read_positions(reader, &bus_name, samples_tx) => {
            match result {
                Ok(_) => info!("📍 Position input ended, delivering the last position until interrupted"),
                Err(e) => warn!("⚠️ Position input failed: {}", e),
            }
            tokio::signal::ctrl_c().await?;
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    info!("🛑 Shutting down...");
    let stats = dispatcher.shutdown().await;
    info!(?stats, "🛑 Shutting down... OK");

    Ok(())
}
