//! Single-producer/single-consumer ring of [`DecisionRecord`]s.
//!
//! Synchronization is carried entirely by two monotonically increasing
//! `u32` counters, `producer` and `consumer`; the ring never locks. This
//! mirrors the sequence-number idiom of a classic SPSC ring buffer: indices
//! are never wrapped except when used to address a slot (`index & mask`),
//! so the `producer - consumer` distance survives wraparound of the
//! counters themselves.

use crate::common::RING_LEN;
use crate::decision::DecisionRecord;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

const fn check_power_of_two(n: u32) -> u32 {
    assert!(n > 0 && n & (n - 1) == 0, "RING_LEN must be a power of two");
    n
}

/// `RING_LEN`, validated at compile time to be a power of two.
const CAPACITY: u32 = check_power_of_two(RING_LEN);
const MASK: u32 = CAPACITY - 1;

/// Fixed-capacity SPSC ring of decision records.
///
/// Exactly one producer (the pipeline's data-path thread) and exactly one
/// consumer may operate on a given `Ring` at a time.
pub struct Ring {
    slots: Box<[UnsafeCell<DecisionRecord>]>,
    producer: AtomicU32,
    consumer: AtomicU32,
    drops: AtomicU64,
}

// SAFETY: slot access is partitioned by the producer/consumer protocol
// below — the producer only ever writes a slot it has exclusive ownership
// of (between observing free space and publishing `producer`), and the
// consumer only ever reads a slot after observing it published.
unsafe impl Sync for Ring {}

impl Ring {
    /// Create an empty ring with `RING_LEN` slots.
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(CAPACITY as usize);
        slots.resize_with(CAPACITY as usize, || UnsafeCell::new(DecisionRecord::default()));
        Self {
            slots: slots.into_boxed_slice(),
            producer: AtomicU32::new(0),
            consumer: AtomicU32::new(0),
            drops: AtomicU64::new(0),
        }
    }

    /// Ring capacity (always `RING_LEN`).
    pub fn capacity(&self) -> u32 {
        CAPACITY
    }

    /// Number of records dropped so far because the ring was full.
    pub fn drop_count(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Current `producer - consumer` distance (records in flight).
    pub fn len(&self) -> u32 {
        let producer = self.producer.load(Ordering::Acquire);
        let consumer = self.consumer.load(Ordering::Acquire);
        producer.wrapping_sub(consumer)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish a single record. `payload_crc16` is computed and written
    /// last, just before the record becomes visible to the consumer.
    ///
    /// Drops the newest record and increments the drop counter if the ring
    /// is full; never blocks, never corrupts the ring.
    pub fn publish(&self, record: &DecisionRecord) {
        let consumer = self.consumer.load(Ordering::Acquire);
        let producer = self.producer.load(Ordering::Relaxed);
        if producer.wrapping_sub(consumer) == CAPACITY {
            self.drops.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(seq = record.seq, "ring full, dropping record");
            return;
        }
        let mut record = *record;
        record.stamp_crc();
        let slot = (producer & MASK) as usize;
        // SAFETY: this slot is not visible to the consumer until the
        // `producer` store below, and no other producer can be racing us.
        unsafe {
            *self.slots[slot].get() = record;
        }
        self.producer.store(producer.wrapping_add(1), Ordering::Release);
    }

    /// Non-blocking consumer-side accessor; see [`RingConsumer`] for the
    /// stateful, cursor-tracking wrapper exposed to external callers.
    fn try_read(&self, at: u32) -> Option<DecisionRecord> {
        let producer = self.producer.load(Ordering::Acquire);
        if at == producer {
            return None;
        }
        let slot = (at & MASK) as usize;
        // SAFETY: `at < producer` was just observed with Acquire, so the
        // producer's write to this slot happens-before this read.
        let record = unsafe { *self.slots[slot].get() };
        Some(record)
    }

    fn advance_consumer(&self, n: u32) {
        let current = self.consumer.load(Ordering::Relaxed);
        self.consumer.store(current.wrapping_add(n), Ordering::Release);
    }
}

impl Default for Ring {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &CAPACITY)
            .field("len", &self.len())
            .field("drops", &self.drop_count())
            .finish()
    }
}

/// Consumer-side cursor into a [`Ring`].
///
/// Not `Clone`/`Sync`: the SPSC contract allows exactly one consumer.
#[derive(Debug)]
pub struct RingConsumer<'a> {
    ring: &'a Ring,
    cursor: u32,
}

impl<'a> RingConsumer<'a> {
    pub fn new(ring: &'a Ring) -> Self {
        Self { ring, cursor: 0 }
    }

    /// Non-blocking read of the next record, if any.
    pub fn try_next(&self) -> Option<DecisionRecord> {
        self.ring.try_read(self.cursor)
    }

    /// Advance the consumer index by `n`, releasing `n` slots back to the
    /// producer.
    pub fn commit(&mut self, n: u32) {
        self.cursor = self.cursor.wrapping_add(n);
        self.ring.advance_consumer(n);
    }

    /// Convenience: read and immediately commit one record.
    pub fn pop(&mut self) -> Option<DecisionRecord> {
        let record = self.try_next()?;
        self.commit(1);
        Some(record)
    }
}
