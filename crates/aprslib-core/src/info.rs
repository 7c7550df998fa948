//! APRS information field: payload bytes plus a coarse data-type tag.

use std::borrow::Cow;
use std::fmt;

/// Coarse APRS data type, read off the first byte of the information
/// field.
///
/// Only the tag is interpreted; the payload itself is never parsed
/// further here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// `>` status report.
    Status,
    /// `!` position, no timestamp, station without APRS messaging.
    PositionNoTimestampNoMsg,
    /// `=` position, no timestamp, station with APRS messaging.
    PositionNoTimestampMsg,
    /// `T` telemetry report.
    Telemetry,
    /// `;` object report.
    Object,
    /// `` ` `` current Mic-E data.
    LegacyMicE,
    /// Anything else, including an empty payload.
    Undefined,
}

impl DataType {
    /// Classify a payload by its first byte.
    pub fn classify(raw: &[u8]) -> Self {
        match raw.first() {
            Some(b'>') => DataType::Status,
            Some(b'!') => DataType::PositionNoTimestampNoMsg,
            Some(b'=') => DataType::PositionNoTimestampMsg,
            Some(b'T') => DataType::Telemetry,
            Some(b';') => DataType::Object,
            Some(b'`') => DataType::LegacyMicE,
            _ => DataType::Undefined,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Status => "status",
            DataType::PositionNoTimestampNoMsg => "position (no timestamp, no messaging)",
            DataType::PositionNoTimestampMsg => "position (no timestamp, messaging)",
            DataType::Telemetry => "telemetry",
            DataType::Object => "object",
            DataType::LegacyMicE => "Mic-E",
            DataType::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// The free-form payload of an APRS frame.
///
/// The raw bytes are kept verbatim so a decoded frame re-encodes
/// byte-identically; [`text`](InformationField::text) gives a lossy UTF-8
/// view for display and logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InformationField {
    data_type: DataType,
    raw: Vec<u8>,
}

impl InformationField {
    /// Wrap a payload, classifying it by its first byte.
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        let raw = raw.into();
        let data_type = DataType::classify(&raw);
        InformationField { data_type, raw }
    }

    /// The data type read off the first byte.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The payload, byte for byte as received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Lossy UTF-8 view of the payload; invalid sequences become
    /// replacement characters.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }
}

impl From<&str> for InformationField {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl fmt::Display for InformationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
