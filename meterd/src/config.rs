use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Meter one named interface; all non-loopback interfaces when unset.
    #[serde(default)]
    pub interface: Option<String>,

    #[serde(default = "default_net_dev_path")]
    pub net_dev_path: String,

    #[serde(default = "default_uptime_path")]
    pub uptime_path: String,

    /// Seconds between reconciliation runs.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Billing window length in days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log directory for file-based logging; logs to console when unset.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_database_path() -> String {
    "data/netmeter.db".to_string()
}

fn default_net_dev_path() -> String {
    "/proc/net/dev".to_string()
}

fn default_uptime_path() -> String {
    "/proc/uptime".to_string()
}

fn default_check_interval_secs() -> u64 {
    300
}

fn default_window_days() -> u32 {
    accounting::DEFAULT_WINDOW_DAYS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            interface: None,
            net_dev_path: default_net_dev_path(),
            uptime_path: default_uptime_path(),
            check_interval_secs: default_check_interval_secs(),
            window_days: default_window_days(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl MeterConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
