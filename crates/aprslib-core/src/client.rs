//! Client trait for APRS-IS access.
//!
//! The [`AprsIs`] trait abstracts over the path a frame takes to the
//! APRS Internet Service. Implementations exist for bidirectional TCP
//! sessions, fire-and-forget UDP datagrams, and one-shot HTTP gateway
//! submissions.
//!
//! Application code holds a `dyn AprsIs` and stays unaware of which
//! transport carries its frames, so an igate loop can be pointed at a
//! mock server in tests and at a real APRS-IS core in production.

use std::fmt;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::frame::Frame;

/// Lifecycle of an APRS-IS client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection. The initial state, and the state after `stop()` or
    /// any connection loss.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Connected, login line sent, waiting for the server to answer.
    Authenticating,
    /// Logged in; frames can be sent and received.
    Connected,
    /// A bounded retry policy ran out of attempts.
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Authenticating => "authenticating",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Asynchronous APRS-IS client.
///
/// Implementations handle connection setup, login, and the wire
/// representation of frames. Frame encoding and decoding stays in
/// [`Frame`]; implementations move its text form over their transport.
#[async_trait]
pub trait AprsIs: Send + Sync {
    /// Connect and authenticate to the configured server.
    ///
    /// Datagram and one-shot transports have no session to set up and
    /// treat this as preparing the local socket.
    async fn start(&mut self) -> Result<()>;

    /// Send a single frame.
    ///
    /// Returns whether the server accepted it. Stream and datagram
    /// transports cannot observe acceptance and report `true` once the
    /// bytes are handed off; the HTTP gateway reports the actual server
    /// verdict.
    async fn send(&mut self, frame: &Frame) -> Result<bool>;

    /// Receive frames until the peer closes the connection, `stop()` is
    /// called, or an I/O error occurs, invoking `handler` once per
    /// decoded frame.
    ///
    /// Server comment lines and frames that fail to decode are skipped;
    /// a clean close by the peer is an `Ok(())` return. Send-only
    /// transports return
    /// [`Error::Unsupported`](crate::error::Error::Unsupported).
    async fn receive(&mut self, handler: &mut (dyn FnMut(Frame) + Send)) -> Result<()> {
        let _ = handler;
        Err(Error::Unsupported("receive".into()))
    }

    /// Close the connection and release the socket.
    ///
    /// After `stop()`, `send()` fails with
    /// [`Error::NotConnected`](crate::error::Error::NotConnected) until
    /// the client is started again.
    async fn stop(&mut self) -> Result<()>;

    /// The current connection state.
    fn state(&self) -> ConnectionState;

    /// Whether the client is logged in and ready for traffic.
    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SendOnly {
        state: ConnectionState,
    }

    #[async_trait]
    impl AprsIs for SendOnly {
        async fn start(&mut self) -> Result<()> {
            self.state = ConnectionState::Connected;
            Ok(())
        }

        async fn send(&mut self, _frame: &Frame) -> Result<bool> {
            Ok(true)
        }

        async fn stop(&mut self) -> Result<()> {
            self.state = ConnectionState::Disconnected;
            Ok(())
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    #[tokio::test]
    async fn default_receive_is_unsupported() {
        let mut client = SendOnly {
            state: ConnectionState::Disconnected,
        };
        let mut sink = |_frame: Frame| {};
        let err = client.receive(&mut sink).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[tokio::test]
    async fn is_connected_tracks_state() {
        let mut client = SendOnly {
            state: ConnectionState::Disconnected,
        };
        assert!(!client.is_connected());
        client.start().await.unwrap();
        assert!(client.is_connected());
        client.stop().await.unwrap();
        assert!(!client.is_connected());
    }

    #[test]
    fn state_display_names() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionState::Authenticating.to_string(), "authenticating");
        assert_eq!(ConnectionState::Failed.to_string(), "failed");
    }
}
