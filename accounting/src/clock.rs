use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{AccountingError, Result};

/// Wall-clock and uptime collaborators behind one seam so reconciliation can
/// be driven from tests.
pub trait Clock: Send + Sync {
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Time since the last device boot.
    fn elapsed_since_boot(&self) -> Result<Duration>;
}

/// Wall time from chrono, uptime from procfs.
pub struct SystemClock {
    uptime_path: PathBuf,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            uptime_path: PathBuf::from("/proc/uptime"),
        }
    }

    pub fn with_uptime_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            uptime_path: path.as_ref().to_path_buf(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn elapsed_since_boot(&self) -> Result<Duration> {
        let raw = fs::read_to_string(&self.uptime_path)?;
        let uptime_secs = raw
            .split_whitespace()
            .next()
            .ok_or_else(|| {
                AccountingError::Malformed(format!("empty uptime data in {}", self.uptime_path.display()))
            })?
            .parse::<f64>()
            .map_err(|_| {
                AccountingError::Malformed(format!("unparseable uptime in {}", self.uptime_path.display()))
            })?;
        Ok(Duration::from_secs_f64(uptime_secs))
    }
}
