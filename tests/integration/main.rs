//! Beacon integration test harness.
//!
//! The network transport is an external collaborator, so these tests stand
//! in for it: decoded announcement and stream-request events flow to the
//! telemetry service over channels, and whatever bytes come back are what
//! a real transport would put on the wire.
//!
//! The service processes events in order, so a stream request doubles as a
//! barrier for announcements sent before it.

mod host_mode;

use anyhow::{Context, Result};
use beacon_core::telemetry::{Appearance, SourceId, TelemetryRecord};
use beacon_services::{CollectorStatus, TelemetryCollector, TelemetryEvent, TelemetryService};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

// ── Harness ───────────────────────────────────────────────────────────────────

/// Stand-in for the transport collaborator: one end of the event channel.
pub struct TestTransport {
    events: mpsc::Sender<TelemetryEvent>,
}

impl TestTransport {
    /// Spawn a service around a fresh (disabled, empty) collector.
    pub fn spawn() -> Self {
        Self::with_collector(TelemetryCollector::new())
    }

    pub fn with_collector(collector: TelemetryCollector) -> Self {
        let (events, rx) = mpsc::channel(16);
        tokio::spawn(TelemetryService::new(collector).run(rx));
        Self { events }
    }

    pub async fn set_collector(&self, enable: bool) -> Result<CollectorStatus> {
        let (reply, status) = oneshot::channel();
        self.events
            .send(TelemetryEvent::SetCollector { enable, reply })
            .await
            .context("service gone")?;
        status.await.context("no toggle reply")
    }

    pub async fn announce(
        &self,
        source: SourceId,
        timestamp: u64,
        payload: Bytes,
        appearance: Option<Appearance>,
    ) -> Result<()> {
        self.events
            .send(TelemetryEvent::Announcement {
                source,
                timestamp,
                payload,
                appearance,
            })
            .await
            .context("service gone")
    }

    pub async fn request_stream(&self) -> Result<Bytes> {
        let (reply, stream) = oneshot::channel();
        self.events
            .send(TelemetryEvent::StreamRequest { reply })
            .await
            .context("service gone")?;
        stream.await.context("stream request unanswered")
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// The i-th test peer, matching the 32-hex-char identities peers use.
pub fn peer(i: u8) -> SourceId {
    SourceId::from_hex(&format!("{i:032x}")).expect("fixture identity")
}

pub fn record(i: u64) -> TelemetryRecord {
    TelemetryRecord {
        latitude: 37.0 + i as f64,
        longitude: -122.0 - i as f64,
        accuracy_meters: 10.0,
        timestamp_millis: (1_703_980_800 + i * 60) * 1000,
    }
}
