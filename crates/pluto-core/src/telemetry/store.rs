//! Owner of the current telemetry snapshot

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;
use log::debug;

use super::message::{DecodeError, TelemetryUpdate, decode_telemetry};
use super::snapshot::TelemetrySnapshot;

/// Holds the latest telemetry and applies inbound updates to it
///
/// Updates are partial: fields absent from a message keep their previous
/// value. A message that fails to decode leaves the store untouched.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    current: TelemetrySnapshot,
}

impl TelemetryStore {
    pub const fn new() -> Self {
        Self {
            current: TelemetrySnapshot::new(),
        }
    }

    /// Decode a raw telemetry frame and merge it into the snapshot
    pub fn apply(&mut self, raw: &str, now: Instant) -> Result<(), DecodeError> {
        let update = decode_telemetry(raw)?;
        self.merge(update, now);
        Ok(())
    }

    /// Merge an already decoded update
    pub fn merge(&mut self, update: TelemetryUpdate, now: Instant) {
        let snapshot = &mut self.current;

        if let Some(price) = update.btc_price {
            snapshot.btc_price = price;
        }
        if let Some(change) = update.btc_change_24h {
            snapshot.btc_change_24h = change;
        }
        if let Some(profit) = update.profit_usd {
            snapshot.profit_usd = profit;
        }
        if let Some(profit) = update.profit_today {
            snapshot.profit_today = profit;
        }
        if let Some(mode) = update.mode {
            snapshot.mode = mode;
        }
        if let Some(points) = update.sparkline.as_ref() {
            snapshot.sparkline.extend_from(points);
        }
        snapshot.last_update = Some(now);

        debug!(
            "Telemetry applied: btc={} change={} mode={:?} points={}",
            snapshot.btc_price,
            snapshot.btc_change_24h,
            snapshot.mode,
            snapshot.sparkline.len()
        );
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.current.clone()
    }

    /// Borrow the current snapshot without copying
    pub fn current(&self) -> &TelemetrySnapshot {
        &self.current
    }

    /// Update only the link flag
    pub fn set_connected(&mut self, connected: bool) {
        self.current.connected = connected;
    }
}

/// Telemetry store guarded by a critical-section mutex
///
/// For transports that deliver messages from another execution context
/// (interrupt or separate task). Every read and write takes the lock for
/// the whole snapshot, so readers never observe a half-applied update.
pub struct SharedTelemetryStore {
    inner: Mutex<CriticalSectionRawMutex, RefCell<TelemetryStore>>,
}

impl SharedTelemetryStore {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(TelemetryStore::new())),
        }
    }

    pub fn apply(&self, raw: &str, now: Instant) -> Result<(), DecodeError> {
        self.inner.lock(|store| store.borrow_mut().apply(raw, now))
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.inner.lock(|store| store.borrow().snapshot())
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner
            .lock(|store| store.borrow_mut().set_connected(connected));
    }
}

impl Default for SharedTelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}
