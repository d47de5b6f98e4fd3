//! Telemetry data model shared by the codec and the collector store.

use bytes::Bytes;

/// Length of a peer's binary source identity in bytes.
pub const SOURCE_ID_LEN: usize = 16;

/// Fixed-size binary identity of a telemetry sender.
///
/// Peers are keyed by this identity everywhere. All conversion between the
/// binary form and the canonical lowercase hex form lives here, so no call
/// site re-derives keys by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId([u8; SOURCE_ID_LEN]);

impl SourceId {
    pub fn new(bytes: [u8; SOURCE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a raw byte slice. The slice must be exactly 16 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        let arr: [u8; SOURCE_ID_LEN] = bytes
            .try_into()
            .map_err(|_| IdentityError::BadLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Parse the canonical 32-hex-char form.
    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SOURCE_ID_LEN] {
        &self.0
    }

    /// Canonical lowercase hex form, used as the store key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Errors from interpreting a source identity.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("source identity must be {SOURCE_ID_LEN} bytes, got {0}")]
    BadLength(usize),
    #[error("source identity is not valid hex: {0}")]
    BadHex(#[from] hex::FromHexError),
}

/// One location sample as produced by a sender, before encoding.
/// Exists only as input to [`crate::wire::encode_sample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub timestamp_millis: u64,
}

/// Optional sender appearance, carried through the collector unmodified.
///
/// On the wire this is an ordered 3-element list; the typed form only
/// exists on this side of the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appearance {
    pub icon: String,
    pub foreground: Bytes,
    pub background: Bytes,
}

/// One element of a telemetry stream: who reported, when, the opaque
/// encoded sample, and how the sender wants to be displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub source: SourceId,
    /// Sender-supplied report time, unix seconds.
    pub timestamp: u64,
    /// Encoded telemetry sample. Opaque to the store.
    pub payload: Bytes,
    pub appearance: Option<Appearance>,
}
