//! Send-only HTTP client for APRS-IS.
//!
//! This module provides [`HttpClient`], which submits frames to an
//! APRS-IS HTTP gateway. Each frame becomes one `POST` whose body is the
//! login line, a newline, and the frame in text form. The gateway
//! acknowledges an accepted submission with `204 No Content`; any other
//! status means the frame was not accepted. There is no receive path.
//!
//! # Example
//!
//! ```no_run
//! use aprslib_aprsis::{AuthSession, HttpClient};
//! use aprslib_core::{AprsIs, Frame};
//!
//! # async fn example() -> aprslib_core::Result<()> {
//! let session = AuthSession::new("W2GMD-6", "12345");
//! let mut client = HttpClient::new(session);
//! client.start().await?;
//!
//! let frame: Frame = "W2GMD-6>APRS:>Hello World!".parse()?;
//! if client.send(&frame).await? {
//!     println!("accepted");
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;

use aprslib_core::client::{AprsIs, ConnectionState};
use aprslib_core::error::{Error, Result};
use aprslib_core::frame::Frame;

use crate::session::AuthSession;

/// Default APRS-IS HTTP submission gateway.
const DEFAULT_URL: &str = "http://srvr.aprs-is.net:8080";

/// Per-request timeout. Submissions are tiny; anything slower than this
/// means the gateway is not going to answer.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Send-only APRS-IS client over HTTP.
///
/// Unlike [`TcpClient`](crate::TcpClient) the gateway acknowledges each
/// submission, so [`send`](AprsIs::send) reports whether the server
/// actually accepted the frame.
pub struct HttpClient {
    session: AuthSession,
    url: String,
    http: Option<reqwest::Client>,
    state: ConnectionState,
}

impl HttpClient {
    /// A client for the default APRS-IS HTTP submission gateway.
    pub fn new(session: AuthSession) -> Self {
        Self::with_url(session, DEFAULT_URL)
    }

    /// A client for an explicit gateway URL.
    pub fn with_url(session: AuthSession, url: impl Into<String>) -> Self {
        HttpClient {
            session,
            url: url.into(),
            http: None,
            state: ConnectionState::Disconnected,
        }
    }

    /// URL of the gateway this client submits to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AprsIs for HttpClient {
    /// Build the HTTP client. No request is made until the first send;
    /// credentials travel in every submission body.
    async fn start(&mut self) -> Result<()> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Connection(format!("HTTP client setup failed: {}", e)))?;

        tracing::debug!(url = %self.url, "HTTP submission client ready");
        self.http = Some(http);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Submit one frame as a `POST`, reporting whether the gateway
    /// accepted it.
    ///
    /// `Ok(true)` only for `204 No Content`. Any other status is a
    /// rejection reported as `Ok(false)`, not an error; errors are
    /// reserved for failing to complete the request at all.
    async fn send(&mut self, frame: &Frame) -> Result<bool> {
        let http = self.http.as_ref().ok_or(Error::NotConnected)?;
        let body = format!("{}\n{}", self.session.login_line(), frame);

        let response = http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(ACCEPT, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %self.url, error = %e, "HTTP submission failed");
                Error::Transmission(format!("HTTP submission failed: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            tracing::trace!(url = %self.url, frame = %frame, "frame accepted by gateway");
            Ok(true)
        } else {
            tracing::warn!(url = %self.url, status = %status, "gateway rejected frame");
            Ok(false)
        }
    }

    async fn stop(&mut self) -> Result<()> {
        self.http = None;
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}
