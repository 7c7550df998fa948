//! aprslib-core: Core types and codecs for aprslib.
//!
//! This crate defines the transport-agnostic pieces of aprslib: callsign
//! and frame codecs, the AX.25 frame check sequence, and the client trait
//! the APRS-IS transports implement. Applications that only parse or
//! build frames depend on this crate without pulling in any networking.
//!
//! # Key types
//!
//! - [`Frame`] -- an APRS frame, convertible between text and AX.25 form
//! - [`Callsign`] -- callsign with SSID and digipeated flag
//! - [`AprsIs`] -- the trait the TCP, UDP, and HTTP clients implement
//! - [`Error`] / [`Result`] -- error handling

pub mod callsign;
pub mod client;
pub mod error;
pub mod fcs;
pub mod frame;
pub mod info;

// Re-export key types at crate root for ergonomic `use aprslib_core::*`.
pub use callsign::Callsign;
pub use client::{AprsIs, ConnectionState};
pub use error::{Error, Result};
pub use fcs::Fcs;
pub use frame::Frame;
pub use info::{DataType, InformationField};
