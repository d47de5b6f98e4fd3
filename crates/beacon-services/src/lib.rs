//! beacon-services — the collector store and the transport-facing
//! telemetry service built on beacon-core.

pub mod clock;
pub mod collector;
pub mod service;

pub use clock::{Clock, SystemClock};
pub use collector::{CollectorStatus, TelemetryCollector};
pub use service::{TelemetryEvent, TelemetryService};
