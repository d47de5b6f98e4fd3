//! Telemetry service — the seam between the transport collaborator and the
//! collector store.
//!
//! The transport stack decodes network messages into [`TelemetryEvent`]s and
//! feeds them over a channel; it transmits whatever bytes come back, without
//! looking at them. This service never touches the network, so tests drive
//! it with plain channels.

use beacon_core::telemetry::{Appearance, SourceId};
use beacon_core::wire::{self, WireError};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::collector::{CollectorStatus, TelemetryCollector};

/// Decoded events the transport collaborator produces.
pub enum TelemetryEvent {
    /// A peer broadcast a telemetry report.
    Announcement {
        source: SourceId,
        /// Report time, unix seconds.
        timestamp: u64,
        /// Encoded sample, passed through opaque.
        payload: Bytes,
        appearance: Option<Appearance>,
    },
    /// A subscriber asked for the retained telemetry stream.
    /// On encode failure the request goes unanswered (sender dropped).
    StreamRequest { reply: oneshot::Sender<Bytes> },
    /// Control-plane toggle of collector mode.
    SetCollector {
        enable: bool,
        reply: oneshot::Sender<CollectorStatus>,
    },
}

pub struct TelemetryService {
    collector: TelemetryCollector,
}

impl TelemetryService {
    pub fn new(collector: TelemetryCollector) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    /// Record a peer's announcement.
    ///
    /// The enabled gate lives here, not in the store: announcements that
    /// arrive while the collector is off are dropped.
    pub fn handle_announcement(
        &self,
        source: &SourceId,
        timestamp: u64,
        payload: Bytes,
        appearance: Option<Appearance>,
    ) {
        if !self.collector.enabled() {
            tracing::trace!(
                source = hex::encode(&source.as_bytes()[..8]),
                "collector disabled, announcement dropped"
            );
            return;
        }
        self.collector.ingest(source, timestamp, payload, appearance);
        tracing::debug!(
            source = hex::encode(&source.as_bytes()[..8]),
            timestamp,
            "announcement recorded"
        );
    }

    /// Assemble the retained telemetry into one wire stream.
    /// Stale entries are dropped before encoding.
    pub fn handle_stream_request(&self) -> Result<Bytes, WireError> {
        let entries = self.collector.export();
        let stream = wire::encode_stream(&entries)?;
        tracing::debug!(
            entries = entries.len(),
            bytes = stream.len(),
            "telemetry stream assembled"
        );
        Ok(stream)
    }

    /// Event loop. Ends when the transport side hangs up.
    pub async fn run(self, mut events: mpsc::Receiver<TelemetryEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                TelemetryEvent::Announcement {
                    source,
                    timestamp,
                    payload,
                    appearance,
                } => self.handle_announcement(&source, timestamp, payload, appearance),
                TelemetryEvent::StreamRequest { reply } => {
                    match self.handle_stream_request() {
                        // Requester may have given up; that's its problem.
                        Ok(stream) => {
                            let _ = reply.send(stream);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "stream request left unanswered");
                        }
                    }
                }
                TelemetryEvent::SetCollector { enable, reply } => {
                    let _ = reply.send(self.collector.set_enabled(enable));
                }
            }
        }
        tracing::debug!("telemetry service stopped");
    }
}
