//! AX.25 Frame Check Sequence.
//!
//! A 16-bit CRC over the frame contents: polynomial 0x8408, LSB-first shift
//! register, initial value 0xFFFF. The digest is the one's complement of the
//! final register value, carried little-endian as the two bytes before the
//! closing frame flag.
//!
//! Bytes are fed bit position 7 down to 0. That order is part of the wire
//! contract: the pinned vectors below only hold for this exact feed order.

use crate::error::{Error, Result};

/// The FCS polynomial (X.25 polynomial, reflected form).
const FCS_POLY: u16 = 0x8408;

/// Running FCS accumulator.
///
/// Feed bytes with [`update`](Fcs::update), then take the 2-byte
/// little-endian digest with [`digest`](Fcs::digest). One accumulator
/// checksums one frame; it is cheap to construct per use.
#[derive(Debug, Clone)]
pub struct Fcs {
    register: u16,
}

impl Fcs {
    /// A fresh accumulator with the register preset to 0xFFFF.
    pub fn new() -> Self {
        Fcs { register: 0xFFFF }
    }

    /// Feed a single bit.
    ///
    /// The register shifts right one position; if the bit shifted out
    /// differs from the incoming bit, the register is XORed with the
    /// polynomial.
    pub fn update_bit(&mut self, bit: bool) {
        let check = self.register & 0x0001 != 0;
        self.register >>= 1;
        if check != bit {
            self.register ^= FCS_POLY;
        }
    }

    /// Feed a byte sequence, bit position 7 down to 0 within each byte.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            for i in (0..8).rev() {
                self.update_bit((byte >> i) & 0x01 == 0x01);
            }
        }
    }

    /// The 2-byte little-endian digest (one's complement of the register).
    pub fn digest(&self) -> [u8; 2] {
        (!self.register).to_le_bytes()
    }
}

impl Default for Fcs {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the FCS digest of `data` in one call.
pub fn fcs_digest(data: &[u8]) -> [u8; 2] {
    let mut fcs = Fcs::new();
    fcs.update(data);
    fcs.digest()
}

/// Check `trailer` against the FCS recomputed over `data`.
///
/// A mismatch is [`Error::Checksum`] carrying both digests; the caller
/// rejects the frame and keeps the stream.
pub fn validate(data: &[u8], trailer: [u8; 2]) -> Result<()> {
    let expected = fcs_digest(data);
    if expected == trailer {
        Ok(())
    } else {
        Err(Error::Checksum {
            expected,
            found: trailer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vectors derived by running the shift-register algorithm by hand;
    // they pin both the polynomial and the bit feed order.

    #[test]
    fn digest_of_empty_input() {
        // Nothing fed: register stays 0xFFFF, complement is 0x0000.
        assert_eq!(fcs_digest(b""), [0x00, 0x00]);
    }

    #[test]
    fn digest_of_check_string() {
        assert_eq!(fcs_digest(b"123456789"), [0x6B, 0x72]);
    }

    #[test]
    fn digest_of_cq_call() {
        assert_eq!(fcs_digest(b"CQ CQ CQ DE W1AW"), [0x0B, 0x08]);
    }

    #[test]
    fn digest_of_single_zero_byte() {
        assert_eq!(fcs_digest(&[0x00]), [0x78, 0xF0]);
    }

    #[test]
    fn incremental_update_matches_one_shot() {
        let data = b"W2GMD-1>OMG,WIDE1-1:test_encode_frame";
        let mut fcs = Fcs::new();
        for chunk in data.chunks(5) {
            fcs.update(chunk);
        }
        assert_eq!(fcs.digest(), fcs_digest(data));
    }

    #[test]
    fn bit_feed_order_is_msb_first_within_a_byte() {
        // 0x01 and 0x80 contain the same single set bit at different
        // positions; the digests must differ if the feed order is honored.
        assert_ne!(fcs_digest(&[0x01]), fcs_digest(&[0x80]));
    }

    #[test]
    fn update_bit_matches_update() {
        let byte = 0xA5u8;
        let mut bitwise = Fcs::new();
        for i in (0..8).rev() {
            bitwise.update_bit((byte >> i) & 0x01 == 0x01);
        }
        assert_eq!(bitwise.digest(), fcs_digest(&[byte]));
    }

    #[test]
    fn validate_accepts_matching_trailer() {
        let data = b"T#005,199,000,255,073,123,01101001";
        let trailer = fcs_digest(data);
        assert!(validate(data, trailer).is_ok());
    }

    #[test]
    fn validate_rejects_corrupted_trailer() {
        let data = b">status: QRV on 144.390";
        let good = fcs_digest(data);
        let bad = [good[0] ^ 0xFF, good[1]];
        let err = validate(data, bad).unwrap_err();
        match err {
            Error::Checksum { expected, found } => {
                assert_eq!(expected, good);
                assert_eq!(found, bad);
            }
            other => panic!("expected Checksum, got: {other:?}"),
        }
    }

    #[test]
    fn default_is_fresh_accumulator() {
        assert_eq!(Fcs::default().digest(), [0x00, 0x00]);
    }
}
