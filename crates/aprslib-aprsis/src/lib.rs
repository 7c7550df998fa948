//! APRS-IS client implementations for aprslib.
//!
//! This crate provides concrete implementations of the [`AprsIs`](aprslib_core::AprsIs)
//! trait from `aprslib-core` for the three ways of reaching the APRS
//! Internet Service:
//!
//! - [`TcpClient`]: bidirectional streaming session with server rotation,
//!   login, and a line-oriented receive loop
//! - [`UdpClient`]: fire-and-forget frame submission as single datagrams
//! - [`HttpClient`]: one-shot frame submission as `POST` requests with a
//!   per-frame accept/reject answer
//!
//! All three share [`AuthSession`] for credentials and the login line.
//!
//! # Example
//!
//! ```no_run
//! use aprslib_aprsis::{AuthSession, TcpClient};
//! use aprslib_core::AprsIs;
//!
//! # async fn example() -> aprslib_core::Result<()> {
//! let session = AuthSession::new("W2GMD-6", "12345").with_filter("r/37.76/-122.44/100");
//! let mut client = TcpClient::new(session);
//! client.start().await?;
//!
//! let frame = "W2GMD-6>APRS:>Hello World!".parse()?;
//! client.send(&frame).await?;
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod session;
pub mod tcp;
pub mod udp;

pub use http::HttpClient;
pub use session::{AuthSession, RetryPolicy, ServerRotation};
pub use tcp::TcpClient;
pub use udp::UdpClient;
