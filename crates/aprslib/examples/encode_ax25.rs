//! Encode a text-form frame to AX.25 bytes and back.
//!
//! Demonstrates the codec on its own, with no network involved: parse a
//! monitor-format frame, hex-dump the flagged AX.25 encoding and the
//! KISS payload, then decode the bytes and confirm the round trip.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p aprslib --example encode_ax25
//! ```

use aprslib::Frame;

fn hex_dump(label: &str, bytes: &[u8]) {
    println!("{} ({} bytes):", label, bytes.len());
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        println!("  {:04x}  {:<47}  {}", i * 16, hex.join(" "), ascii);
    }
}

fn main() -> anyhow::Result<()> {
    let frame: Frame = "W2GMD-1>OMG,WIDE1-1:test_encode_frame".parse()?;

    println!("Text form: {}\n", frame);
    println!("Source:      {}", frame.source());
    println!("Destination: {}", frame.destination());
    for hop in frame.path() {
        println!("Via:         {}", hop);
    }
    println!();

    let ax25 = frame.encode_ax25();
    hex_dump("AX.25 form", &ax25);
    println!();

    let kiss = frame.encode_kiss();
    hex_dump("KISS payload form", &kiss);
    println!();

    let decoded = Frame::decode(&ax25)?;
    println!("Decoded back: {}", decoded);
    assert_eq!(decoded, frame);
    println!("Round trip OK.");

    Ok(())
}
