//! Byte-level helpers: big-endian field readers and the decision-record CRC.

use crc::{Crc, CRC_16_IBM_3740};

/// CRC-16-CCITT (poly 0x1021, init 0xFFFF, no reflection, no final xor) —
/// the `CRC_16_IBM_3740` constant in the `crc` crate matches this exactly.
const CRC16_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Compute the decision-record CRC over the given byte slice.
#[inline]
pub fn crc16_ccitt(bytes: &[u8]) -> u16 {
    CRC16_CCITT.checksum(bytes)
}

/// Read a big-endian `u16` at `offset`. Panics if out of bounds — callers
/// are expected to have validated the message length against the splitter's
/// type table before calling into the decoder.
#[inline]
pub fn be_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes(buf[offset..offset + 2].try_into().unwrap())
}

/// Read a big-endian `u32` at `offset`.
#[inline]
pub fn be_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap())
}

/// Read a big-endian `u64` at `offset`.
#[inline]
pub fn be_u64(buf: &[u8], offset: usize) -> u64 {
    u64::from_be_bytes(buf[offset..offset + 8].try_into().unwrap())
}

/// Read a fixed 8-byte symbol key at `offset`.
#[inline]
pub fn symbol_at(buf: &[u8], offset: usize) -> [u8; 8] {
    buf[offset..offset + 8].try_into().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn be_roundtrip() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(be_u16(&buf, 0), 0x0102);
        assert_eq!(be_u32(&buf, 0), 0x0102_0304);
        assert_eq!(be_u64(&buf, 0), 0x0102_0304_0506_0708);
    }

    #[test]
    fn crc_known_vector() {
        // "123456789" is the standard CRC-16/CCITT-FALSE test vector -> 0x29B1
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }
}
