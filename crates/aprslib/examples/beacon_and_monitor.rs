//! Monitor APRS-IS traffic while beaconing on an interval.
//!
//! Demonstrates running a receiving client and a sending client side by
//! side: `receive()` occupies its own task and hands every decoded frame
//! to the main loop over a channel, while a timer drives periodic status
//! beacons through a separate send-only client. This is the two-task
//! split to use whenever one program must both listen and transmit.
//!
//! # Requirements
//!
//! - Internet access to the APRS-IS rotation (port 14580) and the UDP
//!   submission gateway (port 8080)
//! - A valid passcode for the beacons to be accepted (monitoring alone
//!   works with `-1`)
//!
//! # Usage
//!
//! ```sh
//! cargo run -p aprslib --example beacon_and_monitor
//! ```

use std::time::Duration;

use aprslib::aprsis::{AuthSession, TcpClient, UdpClient};
use aprslib::{AprsIs, Frame};
use tokio::sync::mpsc;

/// Seconds between status beacons.
const BEACON_INTERVAL_SECS: u64 = 600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Replace with your callsign and passcode before running.
    let callsign = "N0CALL-9";
    let passcode = "12345";

    // Receiving side: a TCP session with a narrow filter. Its receive
    // loop runs in a dedicated task, and since the frame handler is
    // synchronous, frames cross back into async context over a channel.
    let session = AuthSession::new(callsign, passcode).with_filter("r/37.76/-122.44/50");
    let mut monitor = TcpClient::new(session);
    let token = monitor.cancellation_token();

    println!("Connecting to APRS-IS...");
    monitor.start().await?;
    println!("Connected to {}.\n", monitor.addr());

    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        println!("\nCtrl-C received, shutting down...");
        token.cancel();
    });

    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    let reader = tokio::spawn(async move {
        let mut forward = move |frame: Frame| {
            let _ = tx.send(frame);
        };
        monitor.receive(&mut forward).await
    });

    // Sending side: a separate send-only client for the beacons.
    let mut beacon = UdpClient::new(AuthSession::new(callsign, passcode));
    beacon.start().await?;
    let status: Frame = format!("{callsign}>APRS,TCPIP*:>aprslib beacon example").parse()?;

    let mut ticker = tokio::time::interval(Duration::from_secs(BEACON_INTERVAL_SECS));
    let mut count = 0usize;
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(frame) => {
                    count += 1;
                    println!("[{:>5}] {}", count, frame);
                }
                // The receive task ended: cancelled, closed, or errored.
                None => break,
            },
            _ = ticker.tick() => {
                beacon.send(&status).await?;
                println!("        beacon sent: {}", status);
            }
        }
    }

    beacon.stop().await?;
    reader.await??;
    println!("\n{} frames received.", count);
    Ok(())
}
