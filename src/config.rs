use crate::prelude::*;

use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(alias = "lrgsConnection")]
    pub lrgs: Lrgs,

    #[serde(alias = "apiConnection")]
    pub api: Api,

    #[serde(default, alias = "goesConfiguration")]
    pub goes: Goes,

    #[serde(default, alias = "timeConfiguration")]
    pub time: Time,

    #[serde(default)]
    pub ingest: Ingest,

    #[serde(default, alias = "goesStations")]
    pub stations: HashMap<String, Station>,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    #[serde(default = "Config::default_message_file")]
    pub message_file: PathBuf,

    /// Optional JSON-lines file every decoded data message is appended to
    pub archive_file: Option<PathBuf>,
}

// Lrgs {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Lrgs {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,

    #[serde(default = "Config::default_lrgs_command")]
    pub command: String,
    #[serde(default = "Config::default_search_file")]
    pub search_file: PathBuf,
}
impl Lrgs {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn search_file(&self) -> &PathBuf {
        &self.search_file
    }
} // }}}

// Api {{{
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Api {
    pub url: String,
    pub username: String,
    pub password: String,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "Config::default_api_timeout", rename = "timeout_secs")]
    pub timeout: Duration,
}
impl Api {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
} // }}}

// Goes {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Goes {
    #[serde(default = "Config::default_data_channel", alias = "dataChannel")]
    pub data_channel: u32,

    #[serde(default = "Config::default_bytes_per_value", alias = "bytesPerValue")]
    pub bytes_per_value: usize,

    #[serde(default = "Config::default_message_delimiter")]
    pub message_delimiter: String,
}
impl Default for Goes {
    fn default() -> Self {
        Self {
            data_channel: Config::default_data_channel(),
            bytes_per_value: Config::default_bytes_per_value(),
            message_delimiter: Config::default_message_delimiter(),
        }
    }
} // }}}

// Time {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Time {
    #[serde(default = "Config::default_century_prefix", alias = "centuryPrefix")]
    pub century_prefix: String,
}
impl Default for Time {
    fn default() -> Self {
        Self {
            century_prefix: Config::default_century_prefix(),
        }
    }
} // }}}

// Ingest {{{
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Ingest {
    /// Messages from the same station within this many seconds of each
    /// other are the same message
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(
        default = "Config::default_duplicate_window",
        rename = "duplicate_window_secs"
    )]
    pub duplicate_window: Duration,

    /// Wait before the single retry of a timed out create
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "Config::default_retry_delay", rename = "retry_delay_secs")]
    pub retry_delay: Duration,
}
impl Default for Ingest {
    fn default() -> Self {
        Self {
            duplicate_window: Config::default_duplicate_window(),
            retry_delay: Config::default_retry_delay(),
        }
    }
} // }}}

// Station {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Station {
    /// Sensor names in the order their values appear in the payload
    pub sensors: Vec<String>,

    #[serde(alias = "numReadings")]
    pub readings_per_sensor: usize,

    #[serde(
        default = "Config::default_reading_interval_minutes",
        alias = "readingIntervalMinutes"
    )]
    pub reading_interval_minutes: u32,
}
impl Station {
    pub fn num_sensors(&self) -> usize {
        self.sensors.len()
    }

    pub fn readings_per_sensor(&self) -> usize {
        self.readings_per_sensor
    }

    pub fn expected_values(&self) -> usize {
        self.num_sensors() * self.readings_per_sensor
    }

    pub fn reading_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.reading_interval_minutes))
    }
} // }}}

/// Read-only handle on the configuration, resolved once at startup.
#[derive(Clone, Debug)]
pub struct ConfigWrapper {
    config: Arc<Config>,
}

impl ConfigWrapper {
    pub fn new(file: &str) -> Result<Self> {
        Ok(Self::from_config(Config::new(file)?))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn lrgs(&self) -> &Lrgs {
        &self.config.lrgs
    }

    pub fn api(&self) -> &Api {
        &self.config.api
    }

    pub fn data_channel(&self) -> u32 {
        self.config.goes.data_channel
    }

    pub fn bytes_per_value(&self) -> usize {
        self.config.goes.bytes_per_value
    }

    pub fn message_delimiter(&self) -> &str {
        &self.config.goes.message_delimiter
    }

    pub fn century_prefix(&self) -> &str {
        &self.config.time.century_prefix
    }

    pub fn duplicate_window(&self) -> Duration {
        self.config.ingest.duplicate_window
    }

    pub fn retry_delay(&self) -> Duration {
        self.config.ingest.retry_delay
    }

    pub fn station(&self, goes_id: &str) -> Option<&Station> {
        self.config.stations.get(goes_id)
    }

    pub fn loglevel(&self) -> &str {
        &self.config.loglevel
    }

    pub fn message_file(&self) -> &PathBuf {
        &self.config.message_file
    }

    pub fn archive_file(&self) -> Option<&PathBuf> {
        self.config.archive_file.as_ref()
    }

    pub fn log_summary(&self) {
        let config = &self.config;

        info!("Configuration loaded successfully:");
        info!("  LRGS: {}:{} as {}", config.lrgs.host, config.lrgs.port, config.lrgs.username);
        info!("    Command: {}", config.lrgs.command);
        info!("    Search File: {}", config.lrgs.search_file.display());
        info!("  API: {} as {}", config.api.url, config.api.username);
        info!("    Timeout: {}s", config.api.timeout.as_secs());
        info!("  Data Channel: {}", config.goes.data_channel);
        info!("  Bytes Per Value: {}", config.goes.bytes_per_value);
        info!("  Century Prefix: {}", config.time.century_prefix);
        info!("  Duplicate Window: {}s", config.ingest.duplicate_window.as_secs());
        info!("  Retry Delay: {}s", config.ingest.retry_delay.as_secs());
        info!("  Message File: {}", config.message_file.display());
        if let Some(archive) = &config.archive_file {
            info!("  Archive File: {}", archive.display());
        }
        info!("  Stations: {} configured", config.stations.len());
        for (goes_id, station) in &config.stations {
            info!(
                "    {}: {} sensors x {} readings every {} minutes",
                goes_id,
                station.num_sensors(),
                station.readings_per_sensor,
                station.reading_interval_minutes
            );
        }
    }
}

impl Config {
    pub fn new(file: &str) -> Result<Self> {
        let content = std::fs::read_to_string(file)
            .map_err(|err| anyhow!("config.rs:error reading {}: {}", file, err))?;

        Self::from_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if let Err(e) = url::Url::parse(&self.api.url) {
            return Err(anyhow!("config.rs:Invalid API URL: {}", e));
        }

        if self.lrgs.port == 0 {
            bail!("lrgs.port must be between 1 and 65535");
        }
        if self.lrgs.host.is_empty() {
            return Err(anyhow!("config.rs:LRGS host cannot be empty"));
        }

        let prefix = &self.time.century_prefix;
        if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_digit()) {
            bail!("time.century_prefix must be two digits, got {:?}", prefix);
        }

        if !(1..=10).contains(&self.goes.bytes_per_value) {
            bail!("goes.bytes_per_value must be between 1 and 10");
        }
        if self.goes.message_delimiter.is_empty() {
            return Err(anyhow!("config.rs:message delimiter cannot be empty"));
        }

        if self.ingest.duplicate_window > Config::max_duplicate_window() {
            bail!(
                "ingest.duplicate_window_secs must be at most {}",
                Config::max_duplicate_window().as_secs()
            );
        }

        for (goes_id, station) in &self.stations {
            if station.sensors.is_empty() {
                bail!("station {} has no sensors", goes_id);
            }
            if station.readings_per_sensor == 0 {
                bail!("station {} readings_per_sensor must be at least 1", goes_id);
            }
            let interval = station.reading_interval_minutes;
            if interval == 0 || 60 % interval != 0 {
                bail!(
                    "station {} reading_interval_minutes must divide an hour, got {}",
                    goes_id,
                    interval
                );
            }
        }

        Ok(())
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_message_file() -> PathBuf {
        PathBuf::from("./latest-messages.txt")
    }

    fn default_lrgs_command() -> String {
        "getDcpMessages".to_string()
    }

    fn default_search_file() -> PathBuf {
        PathBuf::from("./st.sc")
    }

    fn default_api_timeout() -> Duration {
        Duration::from_secs(30)
    }

    fn default_data_channel() -> u32 {
        19
    }

    fn default_bytes_per_value() -> usize {
        3
    }

    fn default_message_delimiter() -> String {
        "\n".to_string()
    }

    fn default_century_prefix() -> String {
        "20".to_string()
    }

    fn default_duplicate_window() -> Duration {
        Duration::from_secs(1)
    }

    pub fn max_duplicate_window() -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    fn default_retry_delay() -> Duration {
        Duration::from_secs(30)
    }

    fn default_reading_interval_minutes() -> u32 {
        15
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
