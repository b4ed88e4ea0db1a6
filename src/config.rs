use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub auto_snapshot: AutoSnapshotConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// Default number of snapshots read for listings, date pickers and comparisons.
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,
}

fn default_list_limit() -> u32 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// CSV export URL of the dealer sheet.
    pub csv_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_cache_bust_param")]
    pub cache_bust_param: String,
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_cache_bust_param() -> String {
    "_".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    /// Save one live auto snapshot per UTC day after a successful refresh.
    #[serde(default)]
    pub daily_snapshot: bool,
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            daily_snapshot: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoSnapshotConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Cron expression (seconds field first), local time. Default: midnight daily.
    #[serde(default = "default_auto_snapshot_schedule")]
    pub schedule: String,
}

fn default_auto_snapshot_schedule() -> String {
    "0 0 0 * * *".into()
}

impl Default for AutoSnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            schedule: default_auto_snapshot_schedule(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (refresh cycles, failures, snapshots saved) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.list_limit > 0,
            "database.list_limit must be > 0, got {}",
            self.database.list_limit
        );
        anyhow::ensure!(
            self.source.csv_url.starts_with("http://") || self.source.csv_url.starts_with("https://"),
            "source.csv_url must be an http(s) URL, got {:?}",
            self.source.csv_url
        );
        anyhow::ensure!(
            self.source.request_timeout_secs > 0,
            "source.request_timeout_secs must be > 0, got {}",
            self.source.request_timeout_secs
        );
        anyhow::ensure!(
            !self.source.cache_bust_param.is_empty(),
            "source.cache_bust_param must be non-empty"
        );
        anyhow::ensure!(
            self.polling.interval_secs > 0,
            "polling.interval_secs must be > 0, got {}",
            self.polling.interval_secs
        );
        if self.auto_snapshot.enabled {
            anyhow::ensure!(
                cron::Schedule::from_str(&self.auto_snapshot.schedule).is_ok(),
                "auto_snapshot.schedule is not a valid cron expression: {:?}",
                self.auto_snapshot.schedule
            );
        }
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
