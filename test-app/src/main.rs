// aprslib test application -- CLI tool for exercising the AX.25 codec and
// all three APRS-IS clients (TCP, UDP, HTTP) against real servers.
//
// Usage:
//   aprslib-test-app decode 'W2GMD-1>OMG,WIDE1-1:test_encode_frame'
//   aprslib-test-app decode --hex '7e 9e 9a 8e 40 40 40 60 ...'
//   aprslib-test-app encode 'W2GMD-1>OMG,WIDE1-1:test_encode_frame' --kiss
//   aprslib-test-app monitor --filter m/50
//   aprslib-test-app --callsign W2GMD-6 --passcode 12345 send 'W2GMD-6>APRS:>Hello' --via http
//   aprslib-test-app --callsign W2GMD-6 --passcode 12345 \
//       --server 127.0.0.1:14580 monitor

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};

use aprslib::aprsis::{AuthSession, HttpClient, TcpClient, UdpClient};
use aprslib::{AprsIs, Frame};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// aprslib test application -- exercises the codec and APRS-IS clients
/// from the command line.
#[derive(Parser)]
#[command(name = "aprslib-test-app", version, about)]
struct Cli {
    /// Callsign to log in with (e.g. W2GMD-6).
    /// Required for `send`; defaults to N0CALL for `monitor`.
    #[arg(long)]
    callsign: Option<String>,

    /// APRS-IS passcode for the callsign.
    /// Required for `send`; defaults to the read-only passcode -1
    /// for `monitor`.
    #[arg(long)]
    passcode: Option<String>,

    /// Server override. `host:port` for TCP and UDP, a URL for HTTP.
    /// Defaults to the public APRS-IS rotation or gateway.
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a frame and print its parts.
    Decode {
        /// Frame in text form, or hex AX.25 bytes with --hex.
        frame: String,

        /// Treat the input as hex-encoded AX.25 bytes.
        #[arg(long)]
        hex: bool,
    },

    /// Encode a text-form frame to AX.25 bytes.
    Encode {
        /// Frame in text form (SOURCE>DEST,PATH:info).
        frame: String,

        /// Also print the KISS payload form (no flags, no FCS).
        #[arg(long)]
        kiss: bool,
    },

    /// Connect to APRS-IS over TCP and print incoming frames.
    Monitor {
        /// Server-side filter expression (e.g. m/50, r/37.76/-122.44/100).
        #[arg(long)]
        filter: Option<String>,

        /// Duration in seconds (0 = run until Ctrl-C).
        #[arg(long, default_value_t = 0)]
        duration: u64,
    },

    /// Send one frame to APRS-IS.
    Send {
        /// Frame in text form (SOURCE>DEST,PATH:info).
        frame: String,

        /// Transport to submit over.
        #[arg(long, default_value = "tcp", value_enum)]
        via: Transport,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Tcp,
    Udp,
    Http,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a hex dump like "7e 9e 9a" or "7e9e9a" into bytes.
fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&cleaned[i..i + 2], 16)
                .map_err(|e| anyhow!("invalid hex byte at offset {}: {}", i / 2, e))
        })
        .collect()
}

fn print_hex(label: &str, bytes: &[u8]) {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    println!("{} ({} bytes): {}", label, bytes.len(), hex.join(" "));
}

fn print_frame(frame: &Frame) {
    println!("Source:      {}", frame.source());
    println!("Destination: {}", frame.destination());
    if frame.path().is_empty() {
        println!("Path:        (none)");
    } else {
        let hops: Vec<String> = frame.path().iter().map(|hop| hop.to_string()).collect();
        println!("Path:        {}", hops.join(","));
    }
    println!("Data type:   {}", frame.info().data_type());
    println!("Info:        {}", frame.info());
    println!("Text form:   {}", frame);
}

/// Session for `monitor`: any callsign works, and the read-only
/// passcode -1 is enough to receive.
fn monitor_session(cli: &Cli, filter: Option<&str>) -> AuthSession {
    let callsign = cli.callsign.as_deref().unwrap_or("N0CALL");
    let passcode = cli.passcode.as_deref().unwrap_or("-1");
    let mut session = AuthSession::new(callsign, passcode);
    if let Some(filter) = filter {
        session = session.with_filter(filter);
    }
    session
}

/// Session for `send`: a real callsign and passcode are required or the
/// server will silently discard the frame.
fn send_session(cli: &Cli) -> Result<AuthSession> {
    let callsign = cli
        .callsign
        .as_deref()
        .context("--callsign is required to send")?;
    let passcode = cli
        .passcode
        .as_deref()
        .context("--passcode is required to send")?;
    Ok(AuthSession::new(callsign, passcode))
}

fn tcp_client(session: AuthSession, server: Option<&str>) -> TcpClient {
    match server {
        Some(addr) => TcpClient::with_servers(session, [addr]),
        None => TcpClient::new(session),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_decode(input: &str, hex: bool) -> Result<()> {
    let frame = if hex {
        let bytes = parse_hex(input)?;
        Frame::decode(&bytes).context("failed to decode AX.25 bytes")?
    } else {
        input
            .parse::<Frame>()
            .context("failed to parse text-form frame")?
    };
    print_frame(&frame);
    Ok(())
}

fn cmd_encode(input: &str, kiss: bool) -> Result<()> {
    let frame: Frame = input.parse().context("failed to parse text-form frame")?;
    print_hex("AX.25", &frame.encode_ax25());
    if kiss {
        print_hex("KISS payload", &frame.encode_kiss());
    }
    Ok(())
}

async fn cmd_monitor(cli: &Cli, filter: Option<&str>, duration: u64) -> Result<()> {
    let session = monitor_session(cli, filter);
    let mut client = tcp_client(session, cli.server.as_deref());

    println!("Connecting to APRS-IS...");
    client.start().await?;
    if duration > 0 {
        println!(
            "Connected to {}. Monitoring for {} seconds...\n",
            client.addr(),
            duration
        );
    } else {
        println!("Connected to {}. Monitoring until Ctrl-C...\n", client.addr());
    }

    let token = client.cancellation_token();
    if duration > 0 {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(duration)).await;
            token.cancel();
        });
    } else {
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nCtrl-C received, shutting down...");
            token.cancel();
        });
    }

    let mut count = 0usize;
    let mut on_frame = |frame: Frame| {
        count += 1;
        println!("{}", frame);
    };
    client.receive(&mut on_frame).await?;

    println!("\n{} frames received.", count);
    Ok(())
}

async fn cmd_send(cli: &Cli, input: &str, via: Transport) -> Result<()> {
    let frame: Frame = input.parse().context("failed to parse text-form frame")?;
    let session = send_session(cli)?;
    let server = cli.server.as_deref();

    match via {
        Transport::Tcp => {
            let mut client = tcp_client(session, server);
            client.start().await?;
            client.send(&frame).await?;
            client.stop().await?;
            println!("Frame written to {}.", client.addr());
        }
        Transport::Udp => {
            let mut client = match server {
                Some(addr) => UdpClient::with_server(session, addr),
                None => UdpClient::new(session),
            };
            client.start().await?;
            client.send(&frame).await?;
            client.stop().await?;
            println!(
                "Frame submitted to {} over UDP (no acknowledgement).",
                client.server()
            );
        }
        Transport::Http => {
            let mut client = match server {
                Some(url) => HttpClient::with_url(session, url),
                None => HttpClient::new(session),
            };
            client.start().await?;
            if client.send(&frame).await? {
                println!("Gateway accepted the frame.");
            } else {
                bail!("gateway rejected the frame (check callsign and passcode)");
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Structured logging; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match &cli.command {
        Command::Decode { frame, hex } => cmd_decode(frame, *hex),
        Command::Encode { frame, kiss } => cmd_encode(frame, *kiss),
        Command::Monitor { filter, duration } => {
            cmd_monitor(&cli, filter.as_deref(), *duration).await
        }
        Command::Send { frame, via } => cmd_send(&cli, frame, *via).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_spaced_and_packed_input() {
        assert_eq!(parse_hex("7e 9e 9a").unwrap(), vec![0x7e, 0x9e, 0x9a]);
        assert_eq!(parse_hex("7e9e9a").unwrap(), vec![0x7e, 0x9e, 0x9a]);
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert!(parse_hex("7e9").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn cli_parses_send_with_transport() {
        let cli = Cli::parse_from([
            "aprslib-test-app",
            "--callsign",
            "W2GMD-6",
            "--passcode",
            "12345",
            "send",
            "W2GMD-6>APRS:>hi",
            "--via",
            "http",
        ]);
        assert_eq!(cli.callsign.as_deref(), Some("W2GMD-6"));
        assert!(matches!(
            cli.command,
            Command::Send {
                via: Transport::Http,
                ..
            }
        ));
    }
}
