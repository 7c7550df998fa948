//! aprslib-test-harness: Test utilities for aprslib.
//!
//! This crate provides [`MockAprsIsServer`], a scripted TCP server that
//! speaks the APRS-IS login dialogue, for deterministic testing of the
//! transport clients without a live APRS-IS core.

pub mod mock_server;

pub use mock_server::{MockAprsIsServer, SessionRecord};
