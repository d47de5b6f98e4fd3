//! beacon-core — shared types, telemetry wire format, and configuration.
//! The services crate depends on this one; this crate depends on nothing async.

pub mod config;
pub mod telemetry;
pub mod wire;

pub use telemetry::{Appearance, SourceId, StreamEntry, TelemetryRecord};
