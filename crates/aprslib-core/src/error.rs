//! Error types for aprslib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Codec errors (callsign, frame, FCS) and
//! transport errors (connect, auth, send) are all captured here.
//!
//! Codec errors are local to the single frame or callsign being processed:
//! a receive loop that hits one logs it and moves on to the next line.
//! Transport errors end the current connection and propagate to the caller,
//! which owns the reconnect policy.

/// The error type for all aprslib operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A callsign failed to parse or encode: base length outside 1..=6,
    /// non-alphanumeric characters, SSID outside 0..=15, or an AX.25
    /// address byte with its address-end bit set where a character byte
    /// was expected.
    #[error("bad callsign: {0}")]
    BadCallsign(String),

    /// A frame is structurally malformed: missing `>` or `:` delimiter in
    /// the text form; missing control/PID delimiter, truncated addressing,
    /// or a non-multiple-of-7 addressing block in the AX.25 form.
    #[error("bad frame: {0}")]
    BadFrame(String),

    /// The FCS trailer of a received AX.25 frame does not match the
    /// checksum recomputed over the frame contents. The frame is rejected;
    /// the stream it came from is still usable.
    #[error("checksum mismatch: expected {expected:02X?}, found {found:02X?}")]
    Checksum {
        /// The digest recomputed over addressing + control/PID + info.
        expected: [u8; 2],
        /// The two trailing bytes actually carried by the frame.
        found: [u8; 2],
    },

    /// Connecting or authenticating to an APRS-IS server failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// A send failed after the connection was established.
    #[error("transmission error: {0}")]
    Transmission(String),

    /// The operation requires an established connection; call `start()` first.
    #[error("not connected")]
    NotConnected,

    /// This transport variant does not support the requested operation
    /// (e.g. `receive()` on the send-only UDP or HTTP gateways).
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
