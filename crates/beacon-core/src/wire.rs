//! Telemetry wire format — msgpack, positional, byte-for-byte compatible
//! with the counterpart protocol's pre-existing clients.
//!
//! These encodings ARE the protocol. Element order, bin/str markers, and
//! minimal-width integers all matter: the peers on the other end were not
//! built from this crate and will not forgive a serde-style rendition with
//! field names or type tags. Changing anything here is a breaking change.
//!
//! A single sample is a 4-element array:
//!   [lat: float64, lon: float64, accuracy: float64, timestamp_millis: uint]
//!
//! A stream is an array of 4-element arrays:
//!   [source_id: bin 16, timestamp: uint, payload: bin, appearance | nil]
//!
//! where appearance, when present, is [icon: str, fg: bin, bg: bin].

use bytes::Bytes;
use rmp::encode;
use rmpv::Value;

use crate::telemetry::{Appearance, SourceId, StreamEntry, TelemetryRecord};

/// Errors from encoding or decoding telemetry payloads.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("telemetry encode failed: {0}")]
    Encoding(String),
    #[error("telemetry decode failed: {0}")]
    Decoding(String),
}

fn enc<E: std::fmt::Display>(e: E) -> WireError {
    WireError::Encoding(e.to_string())
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Encode one location sample into its opaque wire payload.
///
/// Pure function of its inputs. NaN and infinity serialize as ordinary
/// float64 values — the container is well-formed either way.
pub fn encode_sample(record: &TelemetryRecord) -> Result<Bytes, WireError> {
    let mut buf = Vec::with_capacity(32);
    encode::write_array_len(&mut buf, 4).map_err(enc)?;
    encode::write_f64(&mut buf, record.latitude).map_err(enc)?;
    encode::write_f64(&mut buf, record.longitude).map_err(enc)?;
    encode::write_f64(&mut buf, record.accuracy_meters).map_err(enc)?;
    encode::write_uint(&mut buf, record.timestamp_millis).map_err(enc)?;
    Ok(Bytes::from(buf))
}

/// Encode an ordered batch of stream entries into a single self-describing
/// container. An empty batch encodes to the one-byte empty array, which
/// decodes back to zero entries — never an error.
pub fn encode_stream(entries: &[StreamEntry]) -> Result<Bytes, WireError> {
    let mut buf = Vec::new();
    encode::write_array_len(&mut buf, entries.len() as u32).map_err(enc)?;
    for entry in entries {
        encode::write_array_len(&mut buf, 4).map_err(enc)?;
        encode::write_bin(&mut buf, entry.source.as_bytes()).map_err(enc)?;
        encode::write_uint(&mut buf, entry.timestamp).map_err(enc)?;
        encode::write_bin(&mut buf, &entry.payload).map_err(enc)?;
        match &entry.appearance {
            None => encode::write_nil(&mut buf).map_err(enc)?,
            Some(a) => {
                encode::write_array_len(&mut buf, 3).map_err(enc)?;
                encode::write_str(&mut buf, &a.icon).map_err(enc)?;
                encode::write_bin(&mut buf, &a.foreground).map_err(enc)?;
                encode::write_bin(&mut buf, &a.background).map_err(enc)?;
            }
        }
    }
    Ok(Bytes::from(buf))
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Decode one sample payload. Used by tests and by anything validating
/// outbound data before transmission.
pub fn decode_sample(bytes: &[u8]) -> Result<TelemetryRecord, WireError> {
    let mut fields = read_top_level(bytes, 4, "sample")?.into_iter();
    Ok(TelemetryRecord {
        latitude: expect_f64(fields.next(), "latitude")?,
        longitude: expect_f64(fields.next(), "longitude")?,
        accuracy_meters: expect_f64(fields.next(), "accuracy")?,
        timestamp_millis: expect_u64(fields.next(), "timestamp_millis")?,
    })
}

/// Decode a stream container back into its ordered entries.
///
/// Strict inverse of [`encode_stream`]: truncated input, structural
/// mismatches, mis-sized identities, and trailing bytes all fail.
pub fn decode_stream(bytes: &[u8]) -> Result<Vec<StreamEntry>, WireError> {
    let mut rd = bytes;
    let value =
        rmpv::decode::read_value(&mut rd).map_err(|e| WireError::Decoding(e.to_string()))?;
    if !rd.is_empty() {
        return Err(WireError::Decoding(format!(
            "{} trailing bytes after stream container",
            rd.len()
        )));
    }
    let elements = match value {
        Value::Array(elements) => elements,
        _ => return Err(WireError::Decoding("stream is not an array".into())),
    };
    elements.into_iter().map(decode_entry).collect()
}

fn decode_entry(value: Value) -> Result<StreamEntry, WireError> {
    let mut fields = expect_array(value, 4, "stream entry")?.into_iter();

    let source_bytes = expect_bin(fields.next(), "source identity")?;
    let source = SourceId::from_bytes(&source_bytes)
        .map_err(|e| WireError::Decoding(e.to_string()))?;
    let timestamp = expect_u64(fields.next(), "timestamp")?;
    let payload = Bytes::from(expect_bin(fields.next(), "payload")?);
    let appearance = match fields.next() {
        Some(Value::Nil) | None => None,
        Some(value) => Some(decode_appearance(value)?),
    };

    Ok(StreamEntry {
        source,
        timestamp,
        payload,
        appearance,
    })
}

fn decode_appearance(value: Value) -> Result<Appearance, WireError> {
    let mut fields = expect_array(value, 3, "appearance")?.into_iter();
    Ok(Appearance {
        icon: expect_str(fields.next(), "appearance icon")?,
        foreground: Bytes::from(expect_bin(fields.next(), "appearance foreground")?),
        background: Bytes::from(expect_bin(fields.next(), "appearance background")?),
    })
}

// ── Value helpers ────────────────────────────────────────────────────────────

fn read_top_level(bytes: &[u8], len: usize, what: &str) -> Result<Vec<Value>, WireError> {
    let mut rd = bytes;
    let value =
        rmpv::decode::read_value(&mut rd).map_err(|e| WireError::Decoding(e.to_string()))?;
    if !rd.is_empty() {
        return Err(WireError::Decoding(format!(
            "{} trailing bytes after {what}",
            rd.len()
        )));
    }
    expect_array(value, len, what)
}

fn expect_array(value: Value, len: usize, what: &str) -> Result<Vec<Value>, WireError> {
    match value {
        Value::Array(elements) if elements.len() == len => Ok(elements),
        Value::Array(elements) => Err(WireError::Decoding(format!(
            "{what} has {} elements, expected {len}",
            elements.len()
        ))),
        _ => Err(WireError::Decoding(format!("{what} is not an array"))),
    }
}

fn expect_bin(value: Option<Value>, what: &str) -> Result<Vec<u8>, WireError> {
    match value {
        Some(Value::Binary(bytes)) => Ok(bytes),
        _ => Err(WireError::Decoding(format!("{what} is not binary"))),
    }
}

fn expect_u64(value: Option<Value>, what: &str) -> Result<u64, WireError> {
    match value {
        Some(Value::Integer(n)) => n
            .as_u64()
            .ok_or_else(|| WireError::Decoding(format!("{what} is negative"))),
        _ => Err(WireError::Decoding(format!("{what} is not an integer"))),
    }
}

fn expect_f64(value: Option<Value>, what: &str) -> Result<f64, WireError> {
    match value {
        Some(Value::F64(v)) => Ok(v),
        Some(Value::F32(v)) => Ok(v as f64),
        _ => Err(WireError::Decoding(format!("{what} is not a float"))),
    }
}

fn expect_str(value: Option<Value>, what: &str) -> Result<String, WireError> {
    match value {
        Some(Value::String(s)) => s
            .into_str()
            .ok_or_else(|| WireError::Decoding(format!("{what} is not valid UTF-8"))),
        _ => Err(WireError::Decoding(format!("{what} is not a string"))),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
