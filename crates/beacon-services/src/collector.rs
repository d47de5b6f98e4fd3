//! In-memory telemetry retention store.
//!
//! Holds the latest report per peer, nothing more: a new report for a known
//! source replaces the old one, and entries not refreshed within the
//! retention window are dropped. Disabling the collector empties it —
//! "disabled" means "holds nothing", not "stops accepting".
//!
//! All state lives behind one exclusive lock. Inbound handling, stream
//! requests, and the control-plane toggle run concurrently in the full
//! system; every operation here is short and does no I/O while locked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use beacon_core::telemetry::{Appearance, SourceId, StreamEntry};
use bytes::Bytes;

use crate::clock::{Clock, SystemClock};

/// Default retention window: 24 hours.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(86_400);

/// Result of toggling the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorStatus {
    pub success: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    /// Sender-supplied report time, unix seconds. Passed through to exports.
    timestamp: u64,
    payload: Bytes,
    appearance: Option<Appearance>,
    /// Assigned by the store at ingest. Sole basis for expiry.
    received_at: Instant,
}

struct Inner {
    enabled: bool,
    /// Latest report per source, keyed by the identity's canonical hex form.
    entries: HashMap<String, CacheEntry>,
}

/// Cloneable handle to the shared retention store.
#[derive(Clone)]
pub struct TelemetryCollector {
    inner: Arc<Mutex<Inner>>,
    retention: Duration,
    clock: Arc<dyn Clock>,
}

impl TelemetryCollector {
    /// New store: disabled, empty, 24-hour retention, system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self::with_clock(Arc::new(SystemClock), retention)
    }

    /// Construct with an injected clock. Tests use this to advance time
    /// without sleeping.
    pub fn with_clock(clock: Arc<dyn Clock>, retention: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                enabled: false,
                entries: HashMap::new(),
            })),
            retention,
            clock,
        }
    }

    /// Toggle collector mode. Idempotent; never fails.
    ///
    /// Disabling always clears retained telemetry, even when already
    /// disabled. Enabling never touches existing entries.
    pub fn set_enabled(&self, enable: bool) -> CollectorStatus {
        let mut inner = self.lock();
        if !enable {
            let cleared = inner.entries.len();
            inner.entries.clear();
            if cleared > 0 {
                tracing::info!(cleared, "collector disabled, retained telemetry dropped");
            }
        }
        inner.enabled = enable;
        CollectorStatus {
            success: true,
            enabled: inner.enabled,
        }
    }

    /// Record the latest report from a source, replacing any prior one.
    ///
    /// Does not check `enabled` — whether to call while disabled is the
    /// transport-facing caller's decision (see `TelemetryService`).
    pub fn ingest(
        &self,
        source: &SourceId,
        timestamp: u64,
        payload: Bytes,
        appearance: Option<Appearance>,
    ) {
        let received_at = self.clock.now();
        let mut inner = self.lock();
        inner.entries.insert(
            source.to_hex(),
            CacheEntry {
                timestamp,
                payload,
                appearance,
                received_at,
            },
        );
        tracing::trace!(source = %source, timestamp, "telemetry recorded");
    }

    /// Drop every entry older than the retention window.
    pub fn expire(&self) {
        let now = self.clock.now();
        let mut inner = self.lock();
        self.expire_locked(&mut inner, now);
    }

    /// Expire, then snapshot the remaining entries as stream entries in the
    /// store's internal order. Entries whose key no longer parses as an
    /// identity are skipped with a warning rather than failing the export.
    pub fn export(&self) -> Vec<StreamEntry> {
        let now = self.clock.now();
        let mut inner = self.lock();
        self.expire_locked(&mut inner, now);

        let mut out = Vec::with_capacity(inner.entries.len());
        for (key, entry) in &inner.entries {
            match SourceId::from_hex(key) {
                Ok(source) => out.push(StreamEntry {
                    source,
                    timestamp: entry.timestamp,
                    payload: entry.payload.clone(),
                    appearance: entry.appearance.clone(),
                }),
                Err(e) => {
                    tracing::warn!(key, error = %e, "skipping entry with corrupt key");
                }
            }
        }
        out
    }

    pub fn enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    fn expire_locked(&self, inner: &mut Inner, now: Instant) {
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, e| now.saturating_duration_since(e.received_at) <= self.retention);
        let removed = before - inner.entries.len();
        if removed > 0 {
            tracing::debug!(removed, "expired stale telemetry");
        }
    }

    // A poisoned lock means a panic elsewhere while holding it; the map is
    // still structurally sound, so keep serving rather than propagate.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
