//! Callsign parsing and AX.25 address-field encoding.
//!
//! A [`Callsign`] carries a base callsign, an SSID, and the digipeated
//! flag, and converts between the text form used on APRS-IS
//! (`BASE`, `BASE-SSID`, trailing `*` when digipeated) and the packed
//! 7-byte AX.25 address field.
//!
//! Validation happens at construction, so every held value encodes
//! without error: base is 1 to 6 alphanumeric characters (uppercased on
//! input), SSID is 0 to 15.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Width of a packed AX.25 address field.
pub const AX25_ADDR_LEN: usize = 7;

/// An amateur radio callsign with SSID and digipeated flag.
///
/// # Example
///
/// ```
/// use aprslib_core::Callsign;
///
/// let cs: Callsign = "W2GMD-6".parse()?;
/// assert_eq!(cs.base(), "W2GMD");
/// assert_eq!(cs.ssid(), 6);
/// assert!(!cs.digipeated());
/// assert_eq!(cs.to_string(), "W2GMD-6");
/// # Ok::<(), aprslib_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Callsign {
    base: String,
    ssid: u8,
    digipeated: bool,
}

impl Callsign {
    /// Create a callsign from its parts.
    ///
    /// The base is trimmed and uppercased; the digipeated flag starts
    /// cleared. Fails with [`Error::BadCallsign`] if the base is not 1 to 6
    /// alphanumeric characters or the SSID exceeds 15.
    pub fn new(base: &str, ssid: u8) -> Result<Self> {
        let base = base.trim().to_ascii_uppercase();
        validate_base(&base)?;
        validate_ssid(ssid)?;
        Ok(Callsign {
            base,
            ssid,
            digipeated: false,
        })
    }

    /// Set the digipeated flag (rendered as a trailing `*`).
    pub fn with_digipeated(mut self, digipeated: bool) -> Self {
        self.digipeated = digipeated;
        self
    }

    /// The base callsign, without SSID.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The SSID (0 when none was given).
    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// Whether this entry has already been used by a digipeater.
    pub fn digipeated(&self) -> bool {
        self.digipeated
    }

    /// Decode a packed AX.25 address field.
    ///
    /// Each of the first six bytes holds one character shifted left one
    /// bit; a set low bit there marks the end of the address chain and is
    /// never valid inside a character, so it fails the decode. Characters
    /// that are not alphanumeric after unshifting (the space padding) are
    /// dropped. Byte seven packs the SSID in bits 1 to 4 and the
    /// digipeated flag in bit 7; its low bit is the chain terminator and
    /// is ignored here.
    pub fn from_ax25(addr: &[u8]) -> Result<Self> {
        if addr.len() < AX25_ADDR_LEN {
            return Err(Error::BadCallsign(format!(
                "AX.25 address field needs {AX25_ADDR_LEN} bytes, got {}",
                addr.len()
            )));
        }
        let mut base = String::with_capacity(6);
        for &byte in &addr[..6] {
            if byte & 0x01 != 0 {
                return Err(Error::BadCallsign(format!(
                    "bad address-end flag in {:02X?}",
                    &addr[..AX25_ADDR_LEN]
                )));
            }
            let ch = (byte >> 1) as char;
            if ch.is_ascii_alphanumeric() {
                base.push(ch.to_ascii_uppercase());
            }
        }
        if base.is_empty() {
            return Err(Error::BadCallsign(format!(
                "empty AX.25 address: {:02X?}",
                &addr[..AX25_ADDR_LEN]
            )));
        }
        let ssid = (addr[6] >> 1) & 0x0F;
        let digipeated = addr[6] & 0x80 != 0;
        Ok(Callsign {
            base,
            ssid,
            digipeated,
        })
    }

    /// Encode as a packed AX.25 address field.
    ///
    /// The base is space-padded to six characters, each shifted left one
    /// bit; byte seven is `(ssid << 1) | 0x60`, with bit 7 set when
    /// digipeated. The chain-terminator low bit is left clear; the frame
    /// encoder sets it on the last address of the chain.
    pub fn to_ax25(&self) -> [u8; AX25_ADDR_LEN] {
        let mut addr = [0u8; AX25_ADDR_LEN];
        let bytes = self.base.as_bytes();
        for (i, slot) in addr[..6].iter_mut().enumerate() {
            *slot = bytes.get(i).copied().unwrap_or(b' ') << 1;
        }
        addr[6] = (self.ssid << 1) | 0x60;
        if self.digipeated {
            addr[6] |= 0x80;
        }
        addr
    }
}

impl FromStr for Callsign {
    type Err = Error;

    /// Parse the text form: `BASE`, `BASE-SSID`, with an optional trailing
    /// `*` for digipeated entries.
    fn from_str(s: &str) -> Result<Self> {
        let mut token = s.trim();
        let mut digipeated = false;
        if let Some(stripped) = token.strip_suffix('*') {
            digipeated = true;
            token = stripped;
        }
        let (base, ssid) = match token.split_once('-') {
            Some((base, ssid_text)) => {
                let ssid = ssid_text.parse::<u8>().map_err(|_| {
                    Error::BadCallsign(format!("SSID is not a number: {ssid_text:?}"))
                })?;
                (base, ssid)
            }
            None => (token, 0),
        };
        Ok(Self::new(base, ssid)?.with_digipeated(digipeated))
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ssid > 0 {
            write!(f, "{}-{}", self.base, self.ssid)?;
        } else {
            f.write_str(&self.base)?;
        }
        if self.digipeated {
            f.write_str("*")?;
        }
        Ok(())
    }
}

fn validate_base(base: &str) -> Result<()> {
    if base.is_empty() || base.len() > 6 {
        return Err(Error::BadCallsign(format!(
            "base must be 1 to 6 characters: {base:?}"
        )));
    }
    if !base.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(Error::BadCallsign(format!(
            "base must be alphanumeric: {base:?}"
        )));
    }
    Ok(())
}

fn validate_ssid(ssid: u8) -> Result<()> {
    if ssid > 15 {
        return Err(Error::BadCallsign(format!(
            "SSID out of range 0 to 15: {ssid}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =======================================================================
    // Text form
    // =======================================================================

    #[test]
    fn parse_base_and_ssid() {
        let cs: Callsign = "W2GMD-6".parse().unwrap();
        assert_eq!(cs.base(), "W2GMD");
        assert_eq!(cs.ssid(), 6);
        assert!(!cs.digipeated());
    }

    #[test]
    fn parse_without_ssid_defaults_to_zero() {
        let cs: Callsign = "OMG".parse().unwrap();
        assert_eq!(cs.base(), "OMG");
        assert_eq!(cs.ssid(), 0);
    }

    #[test]
    fn parse_trailing_star_sets_digipeated() {
        let cs: Callsign = "WIDE1-1*".parse().unwrap();
        assert_eq!(cs.base(), "WIDE1");
        assert_eq!(cs.ssid(), 1);
        assert!(cs.digipeated());
    }

    #[test]
    fn parse_uppercases_and_trims() {
        let cs: Callsign = " w2gmd-6 ".parse().unwrap();
        assert_eq!(cs.base(), "W2GMD");
        assert_eq!(cs.ssid(), 6);
    }

    #[test]
    fn display_matches_text_form() {
        for text in ["W2GMD-6", "OMG", "WIDE2-2*", "APRX24"] {
            let cs: Callsign = text.parse().unwrap();
            assert_eq!(cs.to_string(), text);
        }
    }

    #[test]
    fn display_omits_zero_ssid() {
        let cs = Callsign::new("N0CALL", 0).unwrap();
        assert_eq!(cs.to_string(), "N0CALL");
    }

    #[test]
    fn rejects_empty_base() {
        assert!(matches!("".parse::<Callsign>(), Err(Error::BadCallsign(_))));
        assert!(matches!(
            "-1".parse::<Callsign>(),
            Err(Error::BadCallsign(_))
        ));
    }

    #[test]
    fn rejects_overlong_base() {
        assert!(matches!(
            "ABCDEFG".parse::<Callsign>(),
            Err(Error::BadCallsign(_))
        ));
    }

    #[test]
    fn rejects_non_alphanumeric_base() {
        assert!(matches!(
            "W2/GMD".parse::<Callsign>(),
            Err(Error::BadCallsign(_))
        ));
    }

    #[test]
    fn rejects_ssid_out_of_range() {
        assert!(matches!(
            "W2GMD-16".parse::<Callsign>(),
            Err(Error::BadCallsign(_))
        ));
        assert!(matches!(Callsign::new("W2GMD", 16), Err(Error::BadCallsign(_))));
    }

    #[test]
    fn rejects_non_numeric_ssid() {
        assert!(matches!(
            "W2GMD-A".parse::<Callsign>(),
            Err(Error::BadCallsign(_))
        ));
    }

    // =======================================================================
    // AX.25 form
    // =======================================================================

    #[test]
    fn encode_ax25_pads_and_shifts() {
        let cs = Callsign::new("W2GMD", 1).unwrap();
        assert_eq!(cs.to_ax25(), [0xAE, 0x64, 0x8E, 0x9A, 0x88, 0x40, 0x62]);
    }

    #[test]
    fn encode_ax25_six_character_base() {
        let cs = Callsign::new("APRX24", 0).unwrap();
        assert_eq!(cs.to_ax25(), [0x82, 0xA0, 0xA4, 0xB0, 0x64, 0x68, 0x60]);
    }

    #[test]
    fn encode_ax25_digipeated_sets_high_bit() {
        let cs = Callsign::new("WIDE1", 1).unwrap().with_digipeated(true);
        assert_eq!(cs.to_ax25()[6], 0xE2);
    }

    #[test]
    fn decode_ax25_round_trips() {
        for text in ["W2GMD-1", "OMG", "WIDE1-1*", "APRX24"] {
            let cs: Callsign = text.parse().unwrap();
            let decoded = Callsign::from_ax25(&cs.to_ax25()).unwrap();
            assert_eq!(decoded, cs);
        }
    }

    #[test]
    fn decode_ax25_ignores_chain_terminator_bit() {
        let mut addr = Callsign::new("W2GMD", 1).unwrap().to_ax25();
        addr[6] |= 0x01;
        let cs = Callsign::from_ax25(&addr).unwrap();
        assert_eq!(cs.base(), "W2GMD");
        assert_eq!(cs.ssid(), 1);
        assert!(!cs.digipeated());
    }

    #[test]
    fn decode_ax25_rejects_end_flag_in_character() {
        // Low bit set inside the character section is only legal as a
        // chain terminator, which never lands there.
        let addr = [0xAF, 0x64, 0x8E, 0x9A, 0x88, 0x40, 0x62];
        assert!(matches!(
            Callsign::from_ax25(&addr),
            Err(Error::BadCallsign(_))
        ));
    }

    #[test]
    fn decode_ax25_rejects_short_field() {
        assert!(matches!(
            Callsign::from_ax25(&[0xAE, 0x64, 0x8E]),
            Err(Error::BadCallsign(_))
        ));
    }

    #[test]
    fn decode_ax25_rejects_all_padding() {
        let addr = [0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x60];
        assert!(matches!(
            Callsign::from_ax25(&addr),
            Err(Error::BadCallsign(_))
        ));
    }
}
