use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use accounting::{AccountingError, Clock, TrafficSource};
use chrono::{DateTime, Utc};

/// Scripted since-boot counters with a failure switch.
#[derive(Clone, Default)]
pub struct MockTrafficSource {
    inner: Arc<MockTrafficInner>,
}

#[derive(Default)]
struct MockTrafficInner {
    rx: AtomicU64,
    tx: AtomicU64,
    fail: AtomicBool,
}

impl MockTrafficSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_counters(&self, rx: u64, tx: u64) {
        self.inner.rx.store(rx, Ordering::SeqCst);
        self.inner.tx.store(tx, Ordering::SeqCst);
    }

    pub fn advance(&self, rx: u64, tx: u64) {
        self.inner.rx.fetch_add(rx, Ordering::SeqCst);
        self.inner.tx.fetch_add(tx, Ordering::SeqCst);
    }

    /// Counters start over, as the OS does on reboot.
    pub fn reboot(&self) {
        self.set_counters(0, 0);
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.fail.store(failing, Ordering::SeqCst);
    }

    fn check_failure(&self) -> accounting::Result<()> {
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(AccountingError::Malformed(
                "scripted counter failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl TrafficSource for MockTrafficSource {
    fn rx_bytes(&self) -> accounting::Result<u64> {
        self.check_failure()?;
        Ok(self.inner.rx.load(Ordering::SeqCst))
    }

    fn tx_bytes(&self) -> accounting::Result<u64> {
        self.check_failure()?;
        Ok(self.inner.tx.load(Ordering::SeqCst))
    }
}

/// Wall clock and uptime driven by the test script.
#[derive(Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualClockInner>>,
}

struct ManualClockInner {
    now: DateTime<Utc>,
    elapsed_since_boot: Duration,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>, elapsed_since_boot: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualClockInner {
                now,
                elapsed_since_boot,
            })),
        }
    }

    /// Moves wall clock and uptime forward together (same boot session).
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.now += chrono::Duration::from_std(by).expect("duration in range");
        inner.elapsed_since_boot += by;
    }

    /// Uptime restarts while the wall clock keeps running.
    pub fn reboot(&self) {
        self.inner.lock().unwrap().elapsed_since_boot = Duration::from_secs(60);
    }
}

impl Clock for ManualClock {
    fn wall_clock(&self) -> DateTime<Utc> {
        self.inner.lock().unwrap().now
    }

    fn elapsed_since_boot(&self) -> accounting::Result<Duration> {
        Ok(self.inner.lock().unwrap().elapsed_since_boot)
    }
}
