//! # aprslib -- AX.25 / APRS for Rust
//!
//! `aprslib` is an asynchronous Rust library for encoding and decoding
//! AX.25 UI frames as used by APRS, and for exchanging those frames with
//! the APRS Internet Service (APRS-IS). It is designed for igates,
//! beacon daemons, trackers, and monitoring tools where a small, honest
//! codec and a resilient network client are what matters.
//!
//! ## Quick Start
//!
//! Add `aprslib` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! aprslib = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Connect to APRS-IS, send a status beacon, and print everything the
//! filter matches:
//!
//! ```no_run
//! use aprslib::{AprsIs, Frame};
//! use aprslib::aprsis::{AuthSession, TcpClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = AuthSession::new("W2GMD-6", "12345").with_filter("m/50");
//!     let mut client = TcpClient::new(session);
//!     client.start().await?;
//!
//!     let beacon: Frame = "W2GMD-6>APRS:>Hello World!".parse()?;
//!     client.send(&beacon).await?;
//!
//!     let mut print = |frame: Frame| println!("{frame}");
//!     client.receive(&mut print).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                  | Purpose                                         |
//! |------------------------|-------------------------------------------------|
//! | `aprslib-core`         | [`Callsign`], [`Frame`], FCS, the [`AprsIs`] trait |
//! | `aprslib-aprsis`       | TCP, UDP, and HTTP APRS-IS clients              |
//! | `aprslib-test-harness` | Scriptable mock APRS-IS server for tests        |
//! | **`aprslib`**          | This facade crate -- re-exports everything      |
//!
//! All three clients implement the [`AprsIs`] trait, so application code
//! can work with `dyn AprsIs` and pick the transport at runtime.
//!
//! ## Frames
//!
//! A [`Frame`] moves between three representations:
//!
//! - **text form** (`SOURCE>DEST,PATH:info`), the monitor format APRS-IS
//!   speaks and [`FromStr`](std::str::FromStr)/[`Display`](std::fmt::Display) handle
//! - **AX.25 form**, the flagged, FCS-protected over-the-air encoding
//!   from [`Frame::encode_ax25`] and [`Frame::decode`]
//! - **KISS payload form**, the same addressing and info without flags or
//!   FCS, from [`Frame::encode_kiss`] for handing to a TNC
//!
//! Decoding validates structure, callsigns, and the frame check sequence;
//! a frame that decodes is a frame that can be re-encoded.

pub use aprslib_core::*;

/// APRS-IS network clients.
///
/// Provides [`TcpClient`](aprsis::TcpClient) for bidirectional streaming
/// sessions, [`UdpClient`](aprsis::UdpClient) and
/// [`HttpClient`](aprsis::HttpClient) for send-only submission, and
/// [`AuthSession`](aprsis::AuthSession) for credentials shared by all
/// three.
pub mod aprsis {
    pub use aprslib_aprsis::*;
}
