use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AccountingError, Result};

/// Cumulative since-boot byte counters for the metered host. Counters start
/// over at zero whenever the device reboots; the accumulator reconciles that.
pub trait TrafficSource: Send + Sync {
    fn rx_bytes(&self) -> Result<u64>;
    fn tx_bytes(&self) -> Result<u64>;
}

/// Counter source backed by /proc/net/dev.
///
/// Sums the receive/transmit byte columns across interfaces, skipping
/// loopback unless a specific interface is pinned.
pub struct ProcTrafficSource {
    path: PathBuf,
    interface: Option<String>,
}

impl ProcTrafficSource {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("/proc/net/dev"),
            interface: None,
        }
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            interface: None,
        }
    }

    /// Restricts metering to one named interface.
    pub fn for_interface<S: Into<String>>(mut self, interface: S) -> Self {
        self.interface = Some(interface.into());
        self
    }

    fn read_counters(&self) -> Result<(u64, u64)> {
        let raw = fs::read_to_string(&self.path)?;
        let mut rx_total = 0u64;
        let mut tx_total = 0u64;

        // First two lines are column headers.
        for line in raw.lines().skip(2) {
            let Some((name, counters)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();

            match &self.interface {
                Some(wanted) if name != wanted => continue,
                None if name == "lo" => continue,
                _ => {}
            }

            let fields: Vec<&str> = counters.split_whitespace().collect();
            if fields.len() < 16 {
                return Err(AccountingError::Malformed(format!(
                    "short counter line for interface {name}"
                )));
            }

            rx_total += parse_counter(name, fields[0])?;
            tx_total += parse_counter(name, fields[8])?;
        }

        Ok((rx_total, tx_total))
    }
}

impl Default for ProcTrafficSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficSource for ProcTrafficSource {
    fn rx_bytes(&self) -> Result<u64> {
        Ok(self.read_counters()?.0)
    }

    fn tx_bytes(&self) -> Result<u64> {
        Ok(self.read_counters()?.1)
    }
}

fn parse_counter(interface: &str, field: &str) -> Result<u64> {
    field.parse::<u64>().map_err(|_| {
        AccountingError::Malformed(format!(
            "unparseable counter '{field}' for interface {interface}"
        ))
    })
}
