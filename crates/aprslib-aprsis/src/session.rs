//! Session plumbing shared by the APRS-IS transport clients.
//!
//! [`AuthSession`] builds the login line every transport sends,
//! [`ServerRotation`] cycles the TCP client through candidate servers, and
//! [`RetryPolicy`] shapes its connect retry loop.

use std::time::Duration;

/// Software identifier reported in the login line unless overridden.
const DEFAULT_SOFTWARE_ID: &str = concat!("aprslib ", env!("CARGO_PKG_VERSION"));

/// Login identity for an APRS-IS session.
///
/// All transports authenticate with the same one-line form:
/// `user {user} pass {passcode} vers {software_id}[ filter {expr}]`.
/// A passcode of `-1` is the receive-only convention.
#[derive(Debug, Clone)]
pub struct AuthSession {
    user: String,
    passcode: String,
    software_id: String,
    filter: Option<String>,
}

impl AuthSession {
    /// A session for `user` with the given passcode and the default
    /// software identifier.
    pub fn new(user: &str, passcode: &str) -> Self {
        AuthSession {
            user: user.to_string(),
            passcode: passcode.to_string(),
            software_id: DEFAULT_SOFTWARE_ID.to_string(),
            filter: None,
        }
    }

    /// Request a server-side filter (e.g. `r/37.7/-122.4/50` for a radius
    /// around San Francisco). Only meaningful on the bidirectional TCP
    /// transport.
    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    /// Override the software identifier reported to the server.
    pub fn with_software_id(mut self, software_id: &str) -> Self {
        self.software_id = software_id.to_string();
        self
    }

    /// The login callsign.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The login line, without line terminator.
    pub fn login_line(&self) -> String {
        let mut line = format!(
            "user {} pass {} vers {}",
            self.user, self.passcode, self.software_id
        );
        if let Some(filter) = &self.filter {
            line.push_str(" filter ");
            line.push_str(filter);
        }
        line
    }
}

/// Cyclic rotation over candidate `host:port` strings.
///
/// The rotation wraps around, so an unbounded retry policy keeps cycling
/// through the same candidates in order.
#[derive(Debug, Clone)]
pub struct ServerRotation {
    servers: Vec<String>,
    next: usize,
}

impl ServerRotation {
    pub fn new(servers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        ServerRotation {
            servers: servers.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }

    /// The next candidate, or `None` when no servers are configured.
    pub fn next_server(&mut self) -> Option<&str> {
        if self.servers.is_empty() {
            return None;
        }
        let index = self.next;
        self.next = (self.next + 1) % self.servers.len();
        Some(&self.servers[index])
    }
}

/// Connect retry policy for the TCP client.
///
/// The historical APRS-IS client behavior is a fixed one-second pause
/// between candidates with no attempt limit; that is the default. Raising
/// `max_delay` above `initial_delay` doubles the pause after each failed
/// attempt up to the cap, and `max_attempts` bounds the loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Pause after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound for the pause. Equal to `initial_delay` keeps it fixed.
    pub max_delay: Duration,
    /// Attempt limit; `None` retries indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// The pause after failed attempt number `attempt` (zero-based):
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Past 2^16 the cap has long since taken over.
        let factor = 1u32 << attempt.min(16);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempts` failures.
    pub fn allows(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts < max,
            None => true,
        }
    }
}
