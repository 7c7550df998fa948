//! Monitor live APRS-IS traffic.
//!
//! Demonstrates a receive-only APRS-IS session: connect with a range
//! filter, then print every frame the server forwards until Ctrl-C.
//! Receiving does not require a valid passcode, so this works with the
//! read-only passcode `-1` and any callsign.
//!
//! # Requirements
//!
//! - Internet access to the APRS-IS rotation (port 14580)
//!
//! # Usage
//!
//! ```sh
//! cargo run -p aprslib --example monitor_aprsis
//! ```

use aprslib::aprsis::{AuthSession, TcpClient};
use aprslib::{AprsIs, Frame};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Read-only login: passcode -1 is accepted for receive, and the
    // filter asks for everything within 100 km of San Francisco.
    let session = AuthSession::new("N0CALL", "-1").with_filter("r/37.76/-122.44/100");

    let mut client = TcpClient::new(session);

    println!("Connecting to APRS-IS...");
    client.start().await?;
    println!("Connected to {}. Monitoring until Ctrl-C...\n", client.addr());

    // Ctrl-C cancels the receive loop from a background task.
    let token = client.cancellation_token();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        println!("\nCtrl-C received, shutting down...");
        token.cancel();
    });

    let mut count = 0usize;
    let mut on_frame = |frame: Frame| {
        count += 1;
        let kind = frame.info().data_type().to_string();
        println!("[{:>5}] {:<40} {}", count, kind, frame);
    };
    client.receive(&mut on_frame).await?;

    println!("\n{} frames received.", count);
    Ok(())
}
