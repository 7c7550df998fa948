//! Send a status beacon through the APRS-IS HTTP gateway.
//!
//! Demonstrates one-shot frame submission: build a frame, POST it, and
//! report whether the gateway accepted it. HTTP is the right transport
//! for cron-style beacons because each submission stands alone and the
//! gateway answers accept or reject per frame.
//!
//! # Requirements
//!
//! - A valid APRS-IS passcode for your callsign (sending with `-1` will
//!   be rejected)
//! - Internet access to the submission gateway (port 8080)
//!
//! # Usage
//!
//! ```sh
//! cargo run -p aprslib --example send_beacon
//! ```

use aprslib::aprsis::{AuthSession, HttpClient};
use aprslib::{AprsIs, Frame};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Replace with your callsign and passcode before running.
    let session = AuthSession::new("N0CALL-9", "12345");

    let mut client = HttpClient::new(session);
    client.start().await?;

    let beacon: Frame = "N0CALL-9>APRS,TCPIP*:>Hello from aprslib!".parse()?;
    println!("Submitting: {}", beacon);

    if client.send(&beacon).await? {
        println!("Gateway accepted the frame.");
    } else {
        println!("Gateway rejected the frame (check callsign and passcode).");
    }

    Ok(())
}
