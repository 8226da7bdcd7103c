//! Decision record: the 64-byte, cache-line-aligned wire format published to
//! the ring.

use crate::common::{Price, SymbolIndex, Timestamp};
use crate::utils::crc16_ccitt;

/// Size in bytes of a packed [`DecisionRecord`].
pub const DECISION_RECORD_SIZE: usize = 64;

/// `flags` bit positions.
pub mod flag_bits {
    pub const ACCEPT: u8 = 0;
    pub const STALE: u8 = 1;
    pub const PRICE_BAND_FAIL: u8 = 2;
    pub const TOKEN_FAIL: u8 = 3;
    pub const POSITION_FAIL: u8 = 4;
    pub const KILL_ACTIVE: u8 = 5;
}

/// The risk gate's verdict on a single book event, exactly as it will be
/// published: 64 bytes, little-endian, 64-byte aligned. The explicit
/// `align(64)` keeps ring slots from sharing a cache line.
#[repr(C, align(64))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecisionRecord {
    pub seq: u32,
    pub reserved0: u32,
    pub ts_ingress: u64,
    pub ts_decision: u64,
    pub symbol_index: u16,
    pub side: u8,
    pub flags: u8,
    pub qty: u32,
    pub price: u32,
    pub ref_price: u32,
    pub feature0: u32,
    pub feature1: i32,
    pub feature2: u32,
    pub payload_crc16: u16,
    pub pad: u16,
    pub reserved1: u64,
}

impl DecisionRecord {
    /// Build a record with every field but the CRC populated. Call
    /// [`DecisionRecord::pack`] to obtain the wire bytes with the CRC
    /// written last.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seq: u32,
        ts_ingress: Timestamp,
        ts_decision: Timestamp,
        symbol_index: SymbolIndex,
        side: u8,
        flags: u8,
        qty: u32,
        price: Price,
        ref_price: Price,
        feature0: u32,
        feature1: i32,
        feature2: u32,
    ) -> Self {
        Self {
            seq,
            reserved0: 0,
            ts_ingress,
            ts_decision,
            symbol_index,
            side,
            flags,
            qty,
            price,
            ref_price,
            feature0,
            feature1,
            feature2,
            payload_crc16: 0,
            pad: 0,
            reserved1: 0,
        }
    }

    /// Pack into 64 little-endian bytes, computing `payload_crc16` over
    /// bytes 0..51 and writing it last.
    pub fn pack(&self) -> [u8; DECISION_RECORD_SIZE] {
        let mut out = [0u8; DECISION_RECORD_SIZE];
        out[0..4].copy_from_slice(&self.seq.to_le_bytes());
        out[4..8].copy_from_slice(&0u32.to_le_bytes());
        out[8..16].copy_from_slice(&self.ts_ingress.to_le_bytes());
        out[16..24].copy_from_slice(&self.ts_decision.to_le_bytes());
        out[24..26].copy_from_slice(&self.symbol_index.to_le_bytes());
        out[26] = self.side;
        out[27] = self.flags;
        out[28..32].copy_from_slice(&self.qty.to_le_bytes());
        out[32..36].copy_from_slice(&self.price.to_le_bytes());
        out[36..40].copy_from_slice(&self.ref_price.to_le_bytes());
        out[40..44].copy_from_slice(&self.feature0.to_le_bytes());
        out[44..48].copy_from_slice(&self.feature1.to_le_bytes());
        out[48..52].copy_from_slice(&self.feature2.to_le_bytes());
        let crc = crc16_ccitt(&out[0..52]);
        out[52..54].copy_from_slice(&crc.to_le_bytes());
        out[54..56].copy_from_slice(&0u16.to_le_bytes());
        out[56..64].copy_from_slice(&0u64.to_le_bytes());
        out
    }

    /// Unpack from a 64-byte little-endian buffer. Does not itself verify
    /// the CRC; use [`DecisionRecord::verify_crc`] for that.
    pub fn unpack(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < DECISION_RECORD_SIZE {
            return None;
        }
        Some(Self {
            seq: u32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            reserved0: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            ts_ingress: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            ts_decision: u64::from_le_bytes(bytes[16..24].try_into().unwrap()),
            symbol_index: u16::from_le_bytes(bytes[24..26].try_into().unwrap()),
            side: bytes[26],
            flags: bytes[27],
            qty: u32::from_le_bytes(bytes[28..32].try_into().unwrap()),
            price: u32::from_le_bytes(bytes[32..36].try_into().unwrap()),
            ref_price: u32::from_le_bytes(bytes[36..40].try_into().unwrap()),
            feature0: u32::from_le_bytes(bytes[40..44].try_into().unwrap()),
            feature1: i32::from_le_bytes(bytes[44..48].try_into().unwrap()),
            feature2: u32::from_le_bytes(bytes[48..52].try_into().unwrap()),
            payload_crc16: u16::from_le_bytes(bytes[52..54].try_into().unwrap()),
            pad: u16::from_le_bytes(bytes[54..56].try_into().unwrap()),
            reserved1: u64::from_le_bytes(bytes[56..64].try_into().unwrap()),
        })
    }

    /// Recompute the CRC over bytes 0..51 of a packed record and compare.
    pub fn verify_crc(bytes: &[u8; DECISION_RECORD_SIZE]) -> bool {
        let expected = u16::from_le_bytes(bytes[52..54].try_into().unwrap());
        crc16_ccitt(&bytes[0..52]) == expected
    }

    pub fn is_accept(&self) -> bool {
        self.flags & (1 << flag_bits::ACCEPT) != 0
    }

    pub const fn size() -> usize {
        DECISION_RECORD_SIZE
    }

    /// Compute the CRC over this record's packed bytes 0..51 and write it
    /// into `payload_crc16`, matching what [`DecisionRecord::pack`] emits.
    pub fn stamp_crc(&mut self) {
        let packed = self.pack();
        self.payload_crc16 = u16::from_le_bytes(packed[52..54].try_into().unwrap());
    }
}

/// Pack multiple records into one contiguous byte vector.
pub fn pack_batch(records: &[DecisionRecord]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(records.len() * DECISION_RECORD_SIZE);
    for r in records {
        buffer.extend_from_slice(&r.pack());
    }
    buffer
}
