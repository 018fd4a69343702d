//! Additive 8-bit frame checksum.
//!
//! The trailing byte of every frame is the wrapping sum of the two length
//! bytes and every payload byte, plus [`CHECKSUM_SEED`]. The same
//! computation is used to build outgoing frames and to verify incoming ones.

use crate::error::ProtocolError;
use crate::frame::FrameHeader;

/// Constant added to every checksum.
pub const CHECKSUM_SEED: u8 = 0x14;

/// Incremental checksum accumulator.
///
/// Addition mod 256 is associative and commutative, so feeding the same
/// bytes in any grouping yields the same result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(u8);

impl Checksum {
    pub fn new() -> Self {
        Self(0)
    }

    /// Adds a single byte.
    pub fn push(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    /// Adds every byte in `data`.
    pub fn update(&mut self, data: &[u8]) {
        for &b in data {
            self.push(b);
        }
    }

    /// Returns the final checksum byte.
    pub fn finish(&self) -> u8 {
        self.0.wrapping_add(CHECKSUM_SEED)
    }
}

/// Computes the checksum over the length bytes and the payload.
pub fn checksum(len_lo: u8, len_hi: u8, payload: &[u8]) -> u8 {
    let mut sum = Checksum::new();
    sum.push(len_lo);
    sum.push(len_hi);
    sum.update(payload);
    sum.finish()
}

/// Verifies a received frame against its trailing checksum byte.
///
/// The checksum is recomputed from the length declared in the header, not
/// from the length of `payload`.
pub fn verify(header: &FrameHeader, payload: &[u8], received: u8) -> Result<(), ProtocolError> {
    let [len_lo, len_hi] = header.payload_len.to_le_bytes();
    let expected = checksum(len_lo, len_hi, payload);
    if expected != received {
        return Err(ProtocolError::ChecksumMismatch {
            expected,
            actual: received,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CommandKind;
    use proptest::prelude::*;

    #[test]
    fn test_known_checksum() {
        // 04 00 34 11 00 00 + 14 = 0x5d
        assert_eq!(checksum(0x04, 0x00, &[0x34, 0x11, 0x00, 0x00]), 0x5d);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(checksum(0, 0, &[]), CHECKSUM_SEED);
    }

    #[test]
    fn test_wraparound() {
        // 0xff * 4 + 0x01 + 0x00 + 0x14 = 0x411 -> 0x11
        assert_eq!(checksum(0x01, 0x00, &[0xff, 0xff, 0xff, 0xff]), 0x11);
    }

    #[test]
    fn test_length_bytes_contribute() {
        let payload = vec![0u8; 0x0102];
        assert_eq!(checksum(0x02, 0x01, &payload), 0x03 + CHECKSUM_SEED);
    }

    #[test]
    fn test_verify() {
        let header = FrameHeader {
            command: CommandKind::Response,
            magic: crate::MAGIC,
            payload_len: 2,
        };
        let payload = [0x01, 0x02];
        let good = checksum(2, 0, &payload);
        assert!(verify(&header, &payload, good).is_ok());

        let result = verify(&header, &payload, good.wrapping_add(1));
        assert_eq!(
            result,
            Err(ProtocolError::ChecksumMismatch {
                expected: good,
                actual: good.wrapping_add(1),
            })
        );
    }

    proptest! {
        #[test]
        fn prop_chunked_matches_whole(
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
            split in any::<prop::sample::Index>(),
        ) {
            let len = payload.len() as u16;
            let [lo, hi] = len.to_le_bytes();
            let whole = checksum(lo, hi, &payload);

            let at = split.index(payload.len() + 1);
            let (a, b) = payload.split_at(at);
            let mut sum = Checksum::new();
            sum.update(b);
            sum.push(hi);
            sum.update(a);
            sum.push(lo);
            prop_assert_eq!(sum.finish(), whole);
        }

        #[test]
        fn prop_matches_wide_sum(payload in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let len = payload.len() as u16;
            let [lo, hi] = len.to_le_bytes();
            let wide: u64 = payload.iter().map(|&b| b as u64).sum::<u64>()
                + lo as u64
                + hi as u64
                + CHECKSUM_SEED as u64;
            prop_assert_eq!(checksum(lo, hi, &payload), (wide % 256) as u8);
        }
    }
}
