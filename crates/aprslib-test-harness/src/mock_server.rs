//! Scripted mock APRS-IS server.
//!
//! [`MockAprsIsServer`] is a TCP listener that speaks just enough of the
//! APRS-IS dialogue to exercise a client: it sends a greeting, reads the
//! login line, answers with a `logresp` comment, then plays back scripted
//! payload chunks. Everything the client sent is recorded for assertions.
//!
//! # Example
//!
//! ```no_run
//! use aprslib_test_harness::MockAprsIsServer;
//!
//! # async fn example() -> std::io::Result<()> {
//! let mut server = MockAprsIsServer::bind().await?;
//! server.send(b"W2GMD>APRS:>hi\r\n");
//! let addr = server.addr().to_string();
//! server.start();
//! // ... connect a client to `addr`, then:
//! let record = server.wait().await.unwrap();
//! assert!(record.login_line.starts_with("user "));
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Greeting comment sent on accept.
pub const GREETING: &str = "# aprslib mock server";

/// Login acknowledgement sent after the login line is read.
pub const LOGRESP: &str = "# logresp MOCK verified, server MOCK";

/// One step of the scripted payload.
#[derive(Debug, Clone)]
enum ScriptStep {
    /// Write these bytes as-is. Chunk boundaries are preserved, so a test
    /// can split a line across steps.
    Send(Vec<u8>),
    /// Sleep before the next step.
    Pause(Duration),
}

/// What the mock server observed during one client session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// The login line the client sent, line terminator stripped.
    pub login_line: String,
    /// Every further line the client sent, in order.
    pub client_lines: Vec<String>,
}

/// A mock APRS-IS server for testing clients against a scripted session.
///
/// The server listens on a random localhost port. [`start`](MockAprsIsServer::start)
/// spawns a task that accepts a single connection, runs the login
/// dialogue, plays the script, and then reads client lines until the
/// client disconnects (or closes immediately when
/// [`close_after_script`](MockAprsIsServer::close_after_script) was set).
pub struct MockAprsIsServer {
    listener: Option<TcpListener>,
    addr: String,
    script: Vec<ScriptStep>,
    close_after_script: bool,
    handle: Option<JoinHandle<Result<SessionRecord, String>>>,
}

impl MockAprsIsServer {
    /// Bind a listener on a random localhost port.
    ///
    /// The listener is held open from this point, so a client may connect
    /// as soon as `start()` has been called.
    pub async fn bind() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?.to_string();
        Ok(Self {
            listener: Some(listener),
            addr,
            script: Vec::new(),
            close_after_script: false,
            handle: None,
        })
    }

    /// The address the server is listening on.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Append raw bytes to the script, written as one chunk.
    pub fn send(&mut self, bytes: &[u8]) {
        self.script.push(ScriptStep::Send(bytes.to_vec()));
    }

    /// Append a pause to the script.
    pub fn pause(&mut self, duration: Duration) {
        self.script.push(ScriptStep::Pause(duration));
    }

    /// Close the connection once the script has been played, instead of
    /// holding it open for client traffic.
    pub fn close_after_script(&mut self) {
        self.close_after_script = true;
    }

    /// Accept one client and run the session in a background task.
    pub fn start(&mut self) {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => return,
        };
        let script: Vec<ScriptStep> = std::mem::take(&mut self.script);
        let close_after_script = self.close_after_script;

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener
                .accept()
                .await
                .map_err(|e| format!("failed to accept connection: {}", e))?;

            stream
                .write_all(format!("{}\r\n", GREETING).as_bytes())
                .await
                .map_err(|e| format!("greeting write error: {}", e))?;

            let mut buf = Vec::new();
            let login_line = match read_line(&mut stream, &mut buf).await {
                Ok(Some(line)) => line,
                Ok(None) => return Err("client disconnected before login".to_string()),
                Err(e) => return Err(format!("login read error: {}", e)),
            };

            stream
                .write_all(format!("{}\r\n", LOGRESP).as_bytes())
                .await
                .map_err(|e| format!("logresp write error: {}", e))?;
            stream
                .flush()
                .await
                .map_err(|e| format!("logresp flush error: {}", e))?;

            for (i, step) in script.iter().enumerate() {
                match step {
                    ScriptStep::Send(bytes) => {
                        stream
                            .write_all(bytes)
                            .await
                            .map_err(|e| format!("script step {}: write error: {}", i, e))?;
                        stream
                            .flush()
                            .await
                            .map_err(|e| format!("script step {}: flush error: {}", i, e))?;
                    }
                    ScriptStep::Pause(duration) => {
                        tokio::time::sleep(*duration).await;
                    }
                }
            }

            let mut client_lines = Vec::new();
            if close_after_script {
                drop(stream);
            } else {
                loop {
                    match read_line(&mut stream, &mut buf).await {
                        Ok(Some(line)) => client_lines.push(line),
                        Ok(None) => break,
                        Err(e) => return Err(format!("client read error: {}", e)),
                    }
                }
            }

            Ok(SessionRecord {
                login_line,
                client_lines,
            })
        });

        self.handle = Some(handle);
    }

    /// Wait for the session task to finish and return what it observed.
    pub async fn wait(self) -> Result<SessionRecord, String> {
        match self.handle {
            Some(handle) => handle
                .await
                .map_err(|e| format!("server task panicked: {}", e))?,
            None => Err("server was never started".to_string()),
        }
    }
}

/// Read one `\n`-terminated line, carrying leftover bytes in `buf`
/// between calls. Returns `None` once the client has disconnected.
async fn read_line(stream: &mut TcpStream, buf: &mut Vec<u8>) -> std::io::Result<Option<String>> {
    loop {
        if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
        }
        let mut chunk = [0u8; 1024];
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_login_dialogue_and_script() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        server.send(b"W2GMD>APRS:>hi\r\n");
        server.close_after_script();
        let addr = server.addr().to_string();
        server.start();

        let mut stream = TcpStream::connect(&addr).await.unwrap();
        let mut buf = Vec::new();

        let greeting = read_line(&mut stream, &mut buf).await.unwrap().unwrap();
        assert_eq!(greeting, GREETING);

        stream
            .write_all(b"user W2GMD pass -1 vers test 1.0\r\n")
            .await
            .unwrap();

        let logresp = read_line(&mut stream, &mut buf).await.unwrap().unwrap();
        assert_eq!(logresp, LOGRESP);

        let payload = read_line(&mut stream, &mut buf).await.unwrap().unwrap();
        assert_eq!(payload, "W2GMD>APRS:>hi");

        // Server closes after the script.
        assert!(read_line(&mut stream, &mut buf).await.unwrap().is_none());

        let record = server.wait().await.unwrap();
        assert_eq!(record.login_line, "user W2GMD pass -1 vers test 1.0");
        assert!(record.client_lines.is_empty());
    }

    #[tokio::test]
    async fn records_client_lines_until_disconnect() {
        let mut server = MockAprsIsServer::bind().await.unwrap();
        let addr = server.addr().to_string();
        server.start();

        let mut stream = TcpStream::connect(&addr).await.unwrap();
        let mut buf = Vec::new();
        read_line(&mut stream, &mut buf).await.unwrap();
        stream.write_all(b"user X pass -1 vers t\r\n").await.unwrap();
        read_line(&mut stream, &mut buf).await.unwrap();

        stream.write_all(b"X>APRS:>one\r\n").await.unwrap();
        stream.write_all(b"X>APRS:>two\r\n").await.unwrap();
        drop(stream);

        let record = server.wait().await.unwrap();
        assert_eq!(record.client_lines, vec!["X>APRS:>one", "X>APRS:>two"]);
    }
}
