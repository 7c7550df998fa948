//! Send-only UDP client for APRS-IS.
//!
//! This module provides [`UdpClient`], which submits frames to an APRS-IS
//! UDP submission gateway. Each frame goes out as one datagram carrying
//! the login line, a newline, and the frame in text form. The gateway
//! never sends anything back, so [`receive`](aprslib_core::AprsIs::receive)
//! is unsupported; use [`TcpClient`](crate::TcpClient) to hear traffic.
//!
//! # Example
//!
//! ```no_run
//! use aprslib_aprsis::{AuthSession, UdpClient};
//! use aprslib_core::{AprsIs, Frame};
//!
//! # async fn example() -> aprslib_core::Result<()> {
//! let session = AuthSession::new("W2GMD-6", "12345");
//! let mut client = UdpClient::new(session);
//! client.start().await?;
//!
//! let frame: Frame = "W2GMD-6>APRS:>Hello World!".parse()?;
//! client.send(&frame).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tokio::net::UdpSocket;

use aprslib_core::client::{AprsIs, ConnectionState};
use aprslib_core::error::{Error, Result};
use aprslib_core::frame::Frame;

use crate::session::AuthSession;

/// Default APRS-IS UDP submission gateway.
const DEFAULT_SERVER: &str = "srvr.aprs-is.net:8080";

/// Send-only APRS-IS client over UDP.
///
/// There is no session to establish: `start()` binds a local socket and
/// every [`send`](AprsIs::send) is a self-contained submission carrying
/// its own credentials. Delivery is fire-and-forget.
pub struct UdpClient {
    session: AuthSession,
    server: String,
    socket: Option<UdpSocket>,
    state: ConnectionState,
}

impl UdpClient {
    /// A client for the default APRS-IS UDP submission gateway.
    pub fn new(session: AuthSession) -> Self {
        Self::with_server(session, DEFAULT_SERVER)
    }

    /// A client for an explicit `host:port` gateway.
    pub fn with_server(session: AuthSession, server: impl Into<String>) -> Self {
        UdpClient {
            session,
            server: server.into(),
            socket: None,
            state: ConnectionState::Disconnected,
        }
    }

    /// Address of the gateway this client submits to.
    pub fn server(&self) -> &str {
        &self.server
    }
}

#[async_trait]
impl AprsIs for UdpClient {
    /// Bind a local socket. No handshake happens; the gateway is only
    /// ever a datagram destination.
    async fn start(&mut self) -> Result<()> {
        self.state = ConnectionState::Connecting;

        let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(|e| {
            tracing::error!(error = %e, "failed to bind UDP socket");
            self.state = ConnectionState::Disconnected;
            Error::Connection(format!("UDP bind failed: {}", e))
        })?;

        tracing::debug!(
            server = %self.server,
            local = ?socket.local_addr().ok(),
            "UDP submission socket bound"
        );
        self.socket = Some(socket);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Send one frame as a single datagram: login line, newline, frame.
    ///
    /// The gateway gives no acknowledgement, so a successful send reports
    /// `true` without any delivery guarantee.
    async fn send(&mut self, frame: &Frame) -> Result<bool> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        let datagram = format!("{}\n{}", self.session.login_line(), frame);

        socket
            .send_to(datagram.as_bytes(), self.server.as_str())
            .await
            .map_err(|e| {
                tracing::error!(server = %self.server, error = %e, "UDP send failed");
                Error::Transmission(format!("UDP send failed: {}", e))
            })?;

        tracing::trace!(server = %self.server, frame = %frame, "frame submitted over UDP");
        Ok(true)
    }

    async fn stop(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            tracing::debug!(server = %self.server, "UDP submission socket closed");
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}
