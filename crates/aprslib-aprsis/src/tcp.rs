//! Bidirectional TCP client for APRS-IS.
//!
//! This module provides [`TcpClient`], which implements the [`AprsIs`]
//! trait over a streaming TCP session: connect to one server out of a
//! rotation, log in, then send frames as CRLF-terminated text lines and
//! receive the server's frame stream line by line.
//!
//! # Example
//!
//! ```no_run
//! use aprslib_aprsis::{AuthSession, TcpClient};
//! use aprslib_core::{AprsIs, Frame};
//!
//! # async fn example() -> aprslib_core::Result<()> {
//! let session = AuthSession::new("W2GMD-6", "12345").with_filter("m/50");
//! let mut client = TcpClient::new(session);
//! client.start().await?;
//!
//! let mut print = |frame: Frame| println!("{frame}");
//! client.receive(&mut print).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use aprslib_core::client::{AprsIs, ConnectionState};
use aprslib_core::error::{Error, Result};
use aprslib_core::frame::Frame;

use crate::session::{AuthSession, RetryPolicy, ServerRotation};

/// Default server rotation: the worldwide round-robin pool first, the
/// North America regional pool as fallback, both on the filter port.
const DEFAULT_SERVERS: [&str; 2] = ["rotate.aprs2.net:14580", "noam.aprs2.net:14580"];

/// Default per-candidate connection timeout (5 seconds).
///
/// Short enough that a dead candidate does not stall the rotation for
/// long; the retry policy handles moving on.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read chunk size for the receive loop.
const RECV_CHUNK: usize = 1024;

/// Maximum accumulation buffer size before reset. APRS-IS lines run a few
/// hundred bytes at most; a server that never sends CRLF cannot grow the
/// buffer past this.
const MAX_BUF: usize = 8192;

/// Bidirectional APRS-IS client over TCP.
///
/// `start()` walks the server rotation under the configured
/// [`RetryPolicy`] until a connection and login succeed. After that,
/// [`send`](AprsIs::send) writes frames and [`receive`](AprsIs::receive)
/// delivers the server's frame stream until the peer closes, an error
/// occurs, or the [cancellation token](TcpClient::cancellation_token) is
/// cancelled.
pub struct TcpClient {
    session: AuthSession,
    servers: ServerRotation,
    retry: RetryPolicy,
    connect_timeout: Duration,
    /// The live stream, `None` whenever disconnected.
    stream: Option<TcpStream>,
    /// Address of the current connection, for logging.
    addr: String,
    /// Partial-line carry between reads.
    buf: Vec<u8>,
    state: ConnectionState,
    cancel: CancellationToken,
}

impl TcpClient {
    /// A client for the default APRS-IS server rotation.
    pub fn new(session: AuthSession) -> Self {
        Self::with_servers(session, DEFAULT_SERVERS)
    }

    /// A client for an explicit rotation of `host:port` candidates.
    pub fn with_servers(
        session: AuthSession,
        servers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        TcpClient {
            session,
            servers: ServerRotation::new(servers),
            retry: RetryPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            stream: None,
            addr: String::new(),
            buf: Vec::new(),
            state: ConnectionState::Disconnected,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the connect retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-candidate connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// A token that interrupts `start()` retry waits and the `receive()`
    /// loop. Clones observe the same cancellation. A fresh token is
    /// issued by the next `start()` after a `stop()`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Address of the server currently (or last) connected to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Open a TCP connection to one candidate.
    async fn try_connect(&self, addr: &str) -> Result<TcpStream> {
        tracing::debug!(
            addr = %addr,
            timeout_ms = self.connect_timeout.as_millis(),
            "connecting to APRS-IS server"
        );

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::Connection(format!("connect timed out: {}", addr)))?
            .map_err(|e| map_connect_error(e, addr))?;

        // Login lines and beacons are small and latency matters more
        // than throughput.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(addr = %addr, error = %e, "failed to set TCP_NODELAY");
        }

        Ok(stream)
    }

    /// Connect to `addr` and run the login dialogue on the new stream.
    async fn connect_and_login(&mut self, addr: &str) -> Result<()> {
        let stream = self.try_connect(addr).await?;
        self.stream = Some(stream);
        self.addr = addr.to_string();
        self.buf.clear();
        self.authenticate().await
    }

    /// Read the server greeting, send the login line, and read the
    /// server's response to it.
    async fn authenticate(&mut self) -> Result<()> {
        self.state = ConnectionState::Authenticating;

        match self.next_line().await? {
            Some(greeting) => {
                tracing::debug!(
                    addr = %self.addr,
                    server = %String::from_utf8_lossy(&greeting),
                    "APRS-IS greeting"
                );
            }
            None => return Err(Error::Connection("server closed before greeting".into())),
        }

        let login = format!("{}\r\n", self.session.login_line());
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        write_line(stream, login.as_bytes())
            .await
            .map_err(|e| Error::Connection(format!("login write failed: {}", e)))?;

        match self.next_line().await? {
            Some(response) => {
                tracing::info!(
                    addr = %self.addr,
                    response = %String::from_utf8_lossy(&response),
                    "APRS-IS login response"
                );
                Ok(())
            }
            None => Err(Error::Connection("server closed during login".into())),
        }
    }

    /// Pull the next complete line out of the stream, reading more chunks
    /// as needed. Bytes past the returned line stay buffered for the next
    /// call. `Ok(None)` means the peer closed the connection.
    async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(line) = take_line(&mut self.buf) {
                return Ok(Some(line));
            }
            if self.buf.len() > MAX_BUF {
                tracing::warn!(
                    addr = %self.addr,
                    len = self.buf.len(),
                    "receive buffer overflow, resetting"
                );
                self.buf.clear();
            }

            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
            let mut chunk = [0u8; RECV_CHUNK];
            let n = stream.read(&mut chunk).await.map_err(map_io_error)?;
            if n == 0 {
                return Ok(None);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Dispatch one complete line: server comments are logged, frames are
    /// decoded and handed to the callback, undecodable lines are dropped.
    fn handle_line(&self, line: &[u8], handler: &mut (dyn FnMut(Frame) + Send)) {
        if line.is_empty() {
            return;
        }
        if line[0] == b'#' {
            let text = String::from_utf8_lossy(line);
            if text.contains("logresp") {
                tracing::info!(addr = %self.addr, line = %text, "APRS-IS login response");
            } else {
                tracing::debug!(addr = %self.addr, line = %text, "APRS-IS server comment");
            }
            return;
        }
        match Frame::decode(line) {
            Ok(frame) => handler(frame),
            Err(e) => {
                tracing::debug!(
                    addr = %self.addr,
                    error = %e,
                    line = %String::from_utf8_lossy(line),
                    "dropping undecodable line"
                );
            }
        }
    }

    /// Drop the stream, shutting it down if still open, and clear the
    /// partial-line carry.
    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(addr = %self.addr, error = %e, "TCP shutdown failed");
            }
            tracing::debug!(addr = %self.addr, "TCP connection closed");
        }
        self.buf.clear();
        self.state = ConnectionState::Disconnected;
    }
}

#[async_trait]
impl AprsIs for TcpClient {
    /// Walk the server rotation until a connection and login succeed.
    ///
    /// A failed candidate is logged and retried per the [`RetryPolicy`];
    /// with the default unbounded policy this loops until a server
    /// accepts or the cancellation token fires.
    async fn start(&mut self) -> Result<()> {
        self.disconnect().await;
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        let mut attempts = 0u32;
        loop {
            let Some(addr) = self.servers.next_server().map(str::to_string) else {
                return Err(Error::Connection("no servers configured".into()));
            };

            self.state = ConnectionState::Connecting;
            match self.connect_and_login(&addr).await {
                Ok(()) => {
                    self.state = ConnectionState::Connected;
                    tracing::info!(
                        addr = %addr,
                        user = %self.session.user(),
                        "APRS-IS session established"
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(addr = %addr, error = %e, "APRS-IS connection attempt failed");
                    self.disconnect().await;
                }
            }

            attempts += 1;
            if !self.retry.allows(attempts) {
                self.state = ConnectionState::Failed;
                return Err(Error::Connection(format!(
                    "giving up after {attempts} connection attempts"
                )));
            }

            let delay = self.retry.delay_for(attempts - 1);
            tracing::debug!(delay_ms = delay.as_millis(), "waiting before next candidate");
            let cancel = self.cancel.clone();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Error::Connection("cancelled while reconnecting".into()));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Write one frame as a CRLF-terminated text line.
    ///
    /// The server gives no per-frame acknowledgement on the stream, so a
    /// successful write reports `true`.
    async fn send(&mut self, frame: &Frame) -> Result<bool> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let mut line = frame.to_string();
        line.push_str("\r\n");

        if let Err(e) = write_line(stream, line.as_bytes()).await {
            tracing::error!(addr = %self.addr, error = %e, "frame send failed");
            self.stream = None;
            self.state = ConnectionState::Disconnected;
            return Err(Error::Transmission(format!("frame write failed: {}", e)));
        }

        tracing::trace!(addr = %self.addr, frame = %frame, "frame sent");
        Ok(true)
    }

    /// Deliver the server's frame stream to `handler`, line by line, in
    /// wire order. Partial lines are carried between reads and never
    /// delivered. Returns `Ok(())` on a clean close by the peer or on
    /// cancellation; socket errors disconnect and propagate.
    async fn receive(&mut self, handler: &mut (dyn FnMut(Frame) + Send)) -> Result<()> {
        if self.stream.is_none() {
            return Err(Error::NotConnected);
        }

        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(addr = %self.addr, "receive loop cancelled");
                    self.disconnect().await;
                    return Ok(());
                }

                line = self.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line, handler),
                    Ok(None) => {
                        tracing::info!(addr = %self.addr, "server closed the connection");
                        self.disconnect().await;
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::error!(addr = %self.addr, error = %e, "receive failed");
                        self.disconnect().await;
                        return Err(e);
                    }
                },
            }
        }
    }

    async fn stop(&mut self) -> Result<()> {
        self.cancel.cancel();
        self.disconnect().await;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

// Log when a client is dropped with the session still open.
impl Drop for TcpClient {
    fn drop(&mut self) {
        if self.stream.is_some() {
            tracing::debug!(addr = %self.addr, "TcpClient dropped, closing connection");
        }
    }
}

/// Split one complete line off the front of `buf`, trimming the CR of a
/// CRLF terminator. `None` when no full line is buffered yet.
fn take_line(buf: &mut Vec<u8>) -> Option<Vec<u8>> {
    let nl = buf.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buf.drain(..=nl).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(line)
}

async fn write_line(stream: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
    stream.write_all(data).await?;
    stream.flush().await
}

/// Map a connection-time I/O error to the appropriate [`Error`] variant.
fn map_connect_error(e: std::io::Error, addr: &str) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => {
            Error::Connection(format!("connection refused: {}", addr))
        }
        _ => Error::Io(e),
    }
}

/// Map a mid-session I/O error to the appropriate [`Error`] variant.
fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::ConnectionAborted => {
            Error::Connection(format!("connection lost: {}", e))
        }
        _ => Error::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aprslib_test_harness::MockAprsIsServer;
    use tokio::net::TcpListener;

    fn test_session() -> AuthSession {
        AuthSession::new("W2GMD-6", "12345").with_software_id("test 1.0")
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
            max_attempts: Some(max_attempts),
        }
    }

    /// Bind a listener and immediately drop it, leaving a port that
    /// refuses connections.
    async fn dead_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    // =======================================================================
    // start()
    // =======================================================================

    #[tokio::test]
    async fn start_connects_and_logs_in() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        let addr = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [addr.clone()]);
        client.start().await.unwrap();

        assert_eq!(client.state(), ConnectionState::Connected);
        assert!(client.is_connected());
        assert_eq!(client.addr(), addr);

        client.stop().await.unwrap();
        let record = server.wait().await.unwrap();
        assert_eq!(record.login_line, "user W2GMD-6 pass 12345 vers test 1.0");
    }

    #[tokio::test]
    async fn start_sends_filter_in_login_line() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        let addr = server.addr().to_string();
        server.start();

        let session = test_session().with_filter("m/50");
        let mut client = TcpClient::with_servers(session, [addr]);
        client.start().await.unwrap();
        client.stop().await.unwrap();

        let record = server.wait().await.unwrap();
        assert_eq!(
            record.login_line,
            "user W2GMD-6 pass 12345 vers test 1.0 filter m/50"
        );
    }

    #[tokio::test]
    async fn start_rotates_to_live_server() {
        let dead = dead_addr().await;
        let mut server = MockAprsIsServer::bind().await.unwrap();
        let live = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [dead, live.clone()])
            .with_retry_policy(fast_retry(4));
        client.start().await.unwrap();

        assert_eq!(client.addr(), live);
        assert!(client.is_connected());
        client.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_gives_up_after_bounded_attempts() {
        let dead = dead_addr().await;
        let mut client =
            TcpClient::with_servers(test_session(), [dead]).with_retry_policy(fast_retry(2));

        let err = client.start().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert_eq!(client.state(), ConnectionState::Failed);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn start_with_no_servers_fails() {
        let mut client = TcpClient::with_servers(test_session(), Vec::<String>::new());
        let err = client.start().await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    // =======================================================================
    // send()
    // =======================================================================

    #[tokio::test]
    async fn send_writes_text_form_line() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        let addr = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [addr]);
        client.start().await.unwrap();

        let frame: Frame = "W2GMD-6>APRS,WIDE1-1:>Hello World!".parse().unwrap();
        let accepted = client.send(&frame).await.unwrap();
        assert!(accepted);

        client.stop().await.unwrap();
        let record = server.wait().await.unwrap();
        assert_eq!(record.client_lines, vec!["W2GMD-6>APRS,WIDE1-1:>Hello World!"]);
    }

    #[tokio::test]
    async fn send_without_connection_fails() {
        let mut client = TcpClient::new(test_session());
        let frame: Frame = "W2GMD>APRS:>hi".parse().unwrap();
        let result = client.send(&frame).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn stop_then_send_fails() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        let addr = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [addr]);
        client.start().await.unwrap();
        client.stop().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Disconnected);

        let frame: Frame = "W2GMD>APRS:>hi".parse().unwrap();
        let result = client.send(&frame).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    // =======================================================================
    // receive()
    // =======================================================================

    #[tokio::test]
    async fn receive_reassembles_split_lines() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        // One comment and one frame, the frame split mid-line across two
        // chunks with a pause in between.
        server.send(b"#comment\r\nW2GMD>AP");
        server.pause(Duration::from_millis(50));
        server.send(b"RS:>hi\r\n");
        server.close_after_script();
        let addr = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [addr]);
        client.start().await.unwrap();

        let mut frames: Vec<Frame> = Vec::new();
        let mut collect = |frame: Frame| frames.push(frame);
        client.receive(&mut collect).await.unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].source().base(), "W2GMD");
        assert_eq!(frames[0].info().raw(), b">hi");
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn receive_skips_comments_and_bad_lines() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        server.send(b"# aprsc 2.1.10 keepalive\r\n");
        server.send(b"not a frame at all\r\n");
        server.send(b"KB1ABC>APRS,WIDE2-2:!3745.60N/12229.85W#\r\n");
        server.close_after_script();
        let addr = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [addr]);
        client.start().await.unwrap();

        let mut frames: Vec<Frame> = Vec::new();
        let mut collect = |frame: Frame| frames.push(frame);
        client.receive(&mut collect).await.unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].source().base(), "KB1ABC");
    }

    #[tokio::test]
    async fn receive_delivers_frames_in_wire_order() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        server.send(b"A1AA>APRS:>first\r\nB2BB>APRS:>second\r\nC3CC>APRS:>third\r\n");
        server.close_after_script();
        let addr = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [addr]);
        client.start().await.unwrap();

        let mut sources: Vec<String> = Vec::new();
        let mut collect = |frame: Frame| sources.push(frame.source().to_string());
        client.receive(&mut collect).await.unwrap();

        assert_eq!(sources, vec!["A1AA", "B2BB", "C3CC"]);
    }

    #[tokio::test]
    async fn receive_resets_oversized_partial_line() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        // Noise with no terminator until well past the buffer bound, then
        // a decodable frame.
        let mut noise = vec![b'A'; 20_000];
        noise.extend_from_slice(b"\r\n");
        server.send(&noise);
        server.send(b"W2GMD>APRS:>ok\r\n");
        server.close_after_script();
        let addr = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [addr]);
        client.start().await.unwrap();

        let mut frames: Vec<Frame> = Vec::new();
        let mut collect = |frame: Frame| frames.push(frame);
        client.receive(&mut collect).await.unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].info().raw(), b">ok");
    }

    #[tokio::test]
    async fn receive_exits_cleanly_on_cancel() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        let addr = server.addr().to_string();
        server.start();

        let mut client = TcpClient::with_servers(test_session(), [addr]);
        client.start().await.unwrap();

        let token = client.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let mut count = 0usize;
        let mut collect = |_frame: Frame| count += 1;
        client.receive(&mut collect).await.unwrap();

        assert_eq!(count, 0);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn receive_without_connection_fails() {
        let mut client = TcpClient::new(test_session());
        let mut sink = |_frame: Frame| {};
        let result = client.receive(&mut sink).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }
}
