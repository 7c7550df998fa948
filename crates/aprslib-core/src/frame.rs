//! AX.25/APRS frame codec.
//!
//! A [`Frame`] is a source, a destination, a digipeater path, and an
//! information field. It converts between the two representations the
//! rest of the crate deals in:
//!
//! - the plain-text monitor form carried on APRS-IS,
//!   `SOURCE>DEST,PATH:INFO`, and
//! - the binary AX.25 UI frame: `0x7E` flag, packed 7-byte address
//!   chain, control `0x03`, protocol ID `0xF0`, information bytes,
//!   2-byte FCS, closing `0x7E` flag.
//!
//! Everything here is pure parsing; no I/O happens in this module.

use std::fmt;
use std::str::FromStr;

use crate::callsign::{AX25_ADDR_LEN, Callsign};
use crate::error::{Error, Result};
use crate::fcs;
use crate::info::InformationField;

/// AX.25 frame flag byte.
const AX25_FLAG: u8 = 0x7E;
/// KISS data-frame marker, present when the bytes came through a KISS TNC.
const KISS_DATA_FRAME: u8 = 0x00;
/// Control field (UI) plus protocol ID (no layer 3): the delimiter between
/// the address chain and the information field.
const ADDR_INFO_DELIM: [u8; 2] = [0x03, 0xF0];
/// AX.25 caps the digipeater chain at 8 entries.
const MAX_PATH: usize = 8;

/// A decoded APRS frame.
///
/// Construction validates the digipeater path length; the callsigns
/// validate themselves, so a held `Frame` always encodes cleanly.
///
/// # Example
///
/// ```
/// use aprslib_core::Frame;
///
/// let frame: Frame = "W2GMD-1>OMG,WIDE1-1:test".parse()?;
/// assert_eq!(frame.source().to_string(), "W2GMD-1");
/// assert_eq!(frame.path().len(), 1);
/// assert_eq!(frame.to_string(), "W2GMD-1>OMG,WIDE1-1:test");
/// # Ok::<(), aprslib_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    source: Callsign,
    destination: Callsign,
    path: Vec<Callsign>,
    info: InformationField,
}

impl Frame {
    /// Assemble a frame from its parts.
    ///
    /// Fails with [`Error::BadFrame`] if the digipeater path has more than
    /// 8 entries.
    pub fn new(
        source: Callsign,
        destination: Callsign,
        path: Vec<Callsign>,
        info: InformationField,
    ) -> Result<Self> {
        if path.len() > MAX_PATH {
            return Err(Error::BadFrame(format!(
                "digipeater path too long: {} entries (max {MAX_PATH})",
                path.len()
            )));
        }
        Ok(Frame {
            source,
            destination,
            path,
            info,
        })
    }

    /// The sending station.
    pub fn source(&self) -> &Callsign {
        &self.source
    }

    /// The destination address (an APRS tocall, not a routing target).
    pub fn destination(&self) -> &Callsign {
        &self.destination
    }

    /// The digipeater path, in hop order.
    pub fn path(&self) -> &[Callsign] {
        &self.path
    }

    /// The information field.
    pub fn info(&self) -> &InformationField {
        &self.info
    }

    /// Decode a frame, detecting the representation.
    ///
    /// Input containing the AX.25 control/PID delimiter is decoded as
    /// binary, anything else as the plain-text monitor form.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if find_delim(raw).is_some() {
            Self::decode_ax25(raw)
        } else {
            Self::decode_text(raw)
        }
    }

    /// Decode the plain-text monitor form, `SOURCE>DEST,PATH:INFO`.
    ///
    /// The source ends at the first `>`; the addressing expression ends at
    /// the first `:` after it. Later `>` or `:` bytes belong to the
    /// information field and are kept verbatim.
    pub fn decode_text(raw: &[u8]) -> Result<Self> {
        let gt = raw
            .iter()
            .position(|&b| b == b'>')
            .ok_or_else(|| Error::BadFrame("missing '>' delimiter".into()))?;
        let colon = raw[gt + 1..]
            .iter()
            .position(|&b| b == b':')
            .map(|i| gt + 1 + i)
            .ok_or_else(|| Error::BadFrame("missing ':' delimiter".into()))?;

        let source: Callsign = callsign_text(&raw[..gt])?.parse()?;
        let mut hops = raw[gt + 1..colon].split(|&b| b == b',');
        let destination: Callsign = callsign_text(hops.next().unwrap_or(&[]))?.parse()?;
        let mut path = Vec::new();
        for hop in hops {
            path.push(callsign_text(hop)?.parse()?);
        }
        let info = InformationField::new(&raw[colon + 1..]);
        Self::new(source, destination, path, info)
    }

    /// Decode a binary AX.25 UI frame.
    ///
    /// Tolerates one `0x7E` flag at each end and, inside those, one KISS
    /// data-frame marker (`0x00`) at each end; the FCS trailer is verified
    /// and stripped before the address chain is unpacked.
    pub fn decode_ax25(raw: &[u8]) -> Result<Self> {
        let mut frame = raw;
        if frame.first() == Some(&AX25_FLAG) {
            frame = &frame[1..];
        }
        if frame.last() == Some(&AX25_FLAG) {
            frame = &frame[..frame.len() - 1];
        }
        if frame.first() == Some(&KISS_DATA_FRAME) {
            frame = &frame[1..];
        }
        if frame.last() == Some(&KISS_DATA_FRAME) {
            frame = &frame[..frame.len() - 1];
        }

        let delim = find_delim(frame)
            .ok_or_else(|| Error::BadFrame("missing control/PID delimiter".into()))?;
        let addressing = &frame[..delim];
        if addressing.len() < 2 * AX25_ADDR_LEN {
            return Err(Error::BadFrame(format!(
                "addressing block too short: {} bytes",
                addressing.len()
            )));
        }
        if addressing.len() % AX25_ADDR_LEN != 0 {
            return Err(Error::BadFrame(format!(
                "addressing block not a multiple of {AX25_ADDR_LEN}: {} bytes",
                addressing.len()
            )));
        }

        let body = &frame[delim + 2..];
        if body.len() < 2 {
            return Err(Error::BadFrame("frame too short for FCS trailer".into()));
        }
        let (info_bytes, trailer) = body.split_at(body.len() - 2);
        fcs::validate(&frame[..frame.len() - 2], [trailer[0], trailer[1]])?;

        let destination = Callsign::from_ax25(&addressing[..AX25_ADDR_LEN])?;
        let source = Callsign::from_ax25(&addressing[AX25_ADDR_LEN..2 * AX25_ADDR_LEN])?;
        let mut path = Vec::new();
        for chunk in addressing[2 * AX25_ADDR_LEN..].chunks_exact(AX25_ADDR_LEN) {
            path.push(Callsign::from_ax25(chunk)?);
        }
        Self::new(source, destination, path, InformationField::new(info_bytes))
    }

    /// Encode as a binary AX.25 UI frame, flags and FCS included.
    pub fn encode_ax25(&self) -> Vec<u8> {
        let content = self.encode_kiss();
        let digest = fcs::fcs_digest(&content);
        let mut out = Vec::with_capacity(content.len() + 4);
        out.push(AX25_FLAG);
        out.extend_from_slice(&content);
        out.extend_from_slice(&digest);
        out.push(AX25_FLAG);
        out
    }

    /// Encode for handing to a KISS TNC: address chain, control/PID
    /// delimiter, and information field, without flags or FCS. The TNC
    /// adds both on air.
    pub fn encode_kiss(&self) -> Vec<u8> {
        let mut out = self.addressing();
        out.extend_from_slice(&ADDR_INFO_DELIM);
        out.extend_from_slice(self.info.raw());
        out
    }

    /// The packed address chain: destination, source, then the path, with
    /// the chain-terminator bit set on the last address.
    fn addressing(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((2 + self.path.len()) * AX25_ADDR_LEN);
        out.extend_from_slice(&self.destination.to_ax25());
        out.extend_from_slice(&self.source.to_ax25());
        for hop in &self.path {
            out.extend_from_slice(&hop.to_ax25());
        }
        if let Some(last) = out.last_mut() {
            *last |= 0x01;
        }
        out
    }
}

impl FromStr for Frame {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode_text(s.as_bytes())
    }
}

impl fmt::Display for Frame {
    /// The plain-text monitor form, `SOURCE>DEST,PATH:INFO`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.source, self.destination)?;
        for hop in &self.path {
            write!(f, ",{hop}")?;
        }
        write!(f, ":{}", self.info)
    }
}

fn find_delim(frame: &[u8]) -> Option<usize> {
    frame.windows(2).position(|w| w == ADDR_INFO_DELIM)
}

fn callsign_text(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw)
        .map_err(|_| Error::BadCallsign(format!("callsign is not valid UTF-8: {raw:02X?}")))
}
