use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    server: Server,
    database: Database,
    tracker: Tracker,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("BUS_TRACKER").separator("__"))
            .build()?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let app_config: AppConfig = config.try_deserialize()?;
        app_config.tracker.validate()?;
        Ok(app_config)
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    address: String,
    geofence_radius_m: f64,
}

impl Server {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn geofence_radius_m(&self) -> f64 {
        self.geofence_radius_m
    }
}

#[derive(Debug, Deserialize)]
pub struct Database {
    path: String,
    seed_file: Option<String>,
}

impl Database {
    /// Path of the SQLite database, `:memory:` keeps everything in memory.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn seed_file(&self) -> Option<&str> {
        self.seed_file.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct Tracker {
    server_url: String,
    #[serde(with = "humantime_serde")]
    tick_interval: Duration,
    significance_threshold_deg: f64,
    sample_buffer_size: usize,
    bus_name: Option<String>,
    driver_phone: Option<String>,
    lookup_retry_ms: u64,
    #[serde(with = "humantime_serde")]
    lookup_retry_max_delay: Duration,
}

impl Tracker {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Message("tracker.tick_interval must be greater than zero".to_string()));
        }
        if self.sample_buffer_size == 0 {
            return Err(ConfigError::Message("tracker.sample_buffer_size must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn significance_threshold_deg(&self) -> f64 {
        self.significance_threshold_deg
    }

    pub fn sample_buffer_size(&self) -> usize {
        self.sample_buffer_size
    }

    pub fn bus_name(&self) -> Option<&str> {
        self.bus_name.as_deref()
    }

    pub fn driver_phone(&self) -> Option<&str> {
        self.driver_phone.as_deref()
    }

    pub fn lookup_retry_ms(&self) -> u64 {
        self.lookup_retry_ms
    }

    pub fn lookup_retry_max_delay(&self) -> Duration {
        self.lookup_retry_max_delay
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                server: Server {
                    address: "127.0.0.1:0".to_string(),
                    geofence_radius_m: 200.0,
                },
                database: Database {
                    path: ":memory:".to_string(),
                    seed_file: None,
                },
                tracker: Tracker {
                    server_url: "http://tracker.url".to_string(),
                    tick_interval: Duration::from_secs(3),
                    significance_threshold_deg: 0.0002,
                    sample_buffer_size: 8,
                    bus_name: None,
                    driver_phone: Some("9876543210".to_string()),
                    lookup_retry_ms: 10,
                    lookup_retry_max_delay: Duration::from_millis(20),
                },
            },
        }
    }

    pub fn server_url(mut self, url: String) -> Self {
        self.config.tracker.server_url = url;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(raw: &str) -> Result<AppConfig, ConfigError> {
        let config = Config::builder().add_source(config::File::from_str(raw, FileFormat::Toml)).build()?;
        AppConfig::from_config(config)
    }

    #[test]
    fn deserializes_durations_and_optional_fields() -> Result<(), ConfigError> {
        let raw = r#"
            [server]
            address = "0.0.0.0:8000"
            geofence_radius_m = 150.0

            [database]
            path = ":memory:"

            [tracker]
            server_url = "http://localhost:8000"
            tick_interval = "3s"
            significance_threshold_deg = 0.0002
            sample_buffer_size = 16
            bus_name = "B002"
            lookup_retry_ms = 500
            lookup_retry_max_delay = "30s"
        "#;

        let config = parse(raw)?;

        assert_eq!(config.server().geofence_radius_m(), 150.0);
        assert_eq!(config.database().seed_file(), None);
        assert_eq!(config.tracker().tick_interval(), Duration::from_secs(3));
        assert_eq!(config.tracker().lookup_retry_max_delay(), Duration::from_secs(30));
        assert_eq!(config.tracker().bus_name(), Some("B002"));
        assert_eq!(config.tracker().driver_phone(), None);
        Ok(())
    }

    #[test]
    fn rejects_a_malformed_tick_interval() {
        let raw = r#"
            [server]
            address = "0.0.0.0:8000"
            geofence_radius_m = 200.0

            [database]
            path = ":memory:"

            [tracker]
            server_url = "http://localhost:8000"
            tick_interval = "often"
            significance_threshold_deg = 0.0002
            sample_buffer_size = 16
            lookup_retry_ms = 500
            lookup_retry_max_delay = "30s"
        "#;

        assert!(parse(raw).is_err());
    }

    #[rstest]
    #[case::zero_tick_interval("0s", 16, "tracker.tick_interval must be greater than zero")]
    #[case::zero_buffer("3s", 0, "tracker.sample_buffer_size must be greater than zero")]
    fn rejects_zero_dispatcher_settings(#[case] tick_interval: &str, #[case] sample_buffer_size: usize, #[case] expected: &str) {
        let raw = format!(
            r#"
            [server]
            address = "0.0.0.0:8000"
            geofence_radius_m = 200.0

            [database]
            path = ":memory:"

            [tracker]
            server_url = "http://localhost:8000"
            tick_interval = "{}"
            significance_threshold_deg = 0.0002
            sample_buffer_size = {}
            lookup_retry_ms = 500
            lookup_retry_max_delay = "30s"
        "#,
            tick_interval, sample_buffer_size
        );

        match parse(&raw) {
            Err(ConfigError::Message(message)) => assert_eq!(message, expected),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }
}
