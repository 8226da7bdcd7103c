//! Counters and the ingress→decision latency histogram.

use crate::common::{HISTOGRAM_BINS, HISTOGRAM_BIN_WIDTH_NS};
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-width latency histogram over `decision_ts - ingress_ts`.
///
/// Bin width and count are compile-time constants; the top bin saturates
/// rather than growing, matching the hardware-sized counter it stands in
/// for.
#[derive(Debug)]
pub struct LatencyHistogram {
    bins: [AtomicU64; HISTOGRAM_BINS],
    min_ns: AtomicU64,
    max_ns: AtomicU64,
    sum_ns: AtomicU64,
    count: AtomicU64,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        Self {
            bins: std::array::from_fn(|_| AtomicU64::new(0)),
            min_ns: AtomicU64::new(u64::MAX),
            max_ns: AtomicU64::new(0),
            sum_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record one latency sample, in nanoseconds.
    pub fn record(&self, latency_ns: u64) {
        let bin = ((latency_ns / HISTOGRAM_BIN_WIDTH_NS) as usize).min(HISTOGRAM_BINS - 1);
        self.bins[bin].fetch_add(1, Ordering::Relaxed);
        self.sum_ns.fetch_add(latency_ns, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.min_ns.fetch_min(latency_ns, Ordering::Relaxed);
        self.max_ns.fetch_max(latency_ns, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn min_ns(&self) -> u64 {
        let v = self.min_ns.load(Ordering::Relaxed);
        if v == u64::MAX { 0 } else { v }
    }

    pub fn max_ns(&self) -> u64 {
        self.max_ns.load(Ordering::Relaxed)
    }

    /// Arithmetic mean latency, in nanoseconds.
    pub fn mean_ns(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        self.sum_ns.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Bin counts, for off-line percentile computation.
    pub fn bins(&self) -> [u64; HISTOGRAM_BINS] {
        std::array::from_fn(|i| self.bins[i].load(Ordering::Relaxed))
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonic saturating counters for the pipeline.
#[derive(Debug, Default)]
pub struct Counters {
    pub rx_packets: AtomicU64,
    pub rx_bytes: AtomicU64,
    pub crc_errors: AtomicU64,
    pub seq_gaps: AtomicU64,
    pub seq_dupes: AtomicU64,
    pub parsed_messages: AtomicU64,
    pub book_updates: AtomicU64,
    pub risk_accepts: AtomicU64,
    pub risk_reject_kill: AtomicU64,
    pub risk_reject_stale: AtomicU64,
    pub risk_reject_price_band: AtomicU64,
    pub risk_reject_token: AtomicU64,
    pub risk_reject_position: AtomicU64,
    pub published: AtomicU64,
    pub ring_drops: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rx_packets(&self) {
        Self::inc(&self.rx_packets);
    }
    pub fn add_rx_bytes(&self, n: u64) {
        self.rx_bytes.fetch_add(n, Ordering::Relaxed);
    }
    pub fn inc_seq_gaps(&self) {
        Self::inc(&self.seq_gaps);
    }
    pub fn inc_seq_dupes(&self) {
        Self::inc(&self.seq_dupes);
    }
    pub fn inc_parsed_messages(&self) {
        Self::inc(&self.parsed_messages);
    }
    pub fn inc_book_updates(&self) {
        Self::inc(&self.book_updates);
    }
    pub fn inc_published(&self) {
        Self::inc(&self.published);
    }
    pub fn inc_ring_drops(&self) {
        Self::inc(&self.ring_drops);
    }
}

/// Read-only aggregate snapshot returned by `snapshot_stats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub seq_gaps: u64,
    pub seq_dupes: u64,
    pub parsed_messages: u64,
    pub book_updates: u64,
    pub risk_accepts: u64,
    pub risk_rejects: u64,
    pub published: u64,
    pub ring_drops: u64,
    pub latency_mean_ns: f64,
    pub latency_min_ns: u64,
    pub latency_max_ns: u64,
}

impl Stats {
    pub fn capture(counters: &Counters, histogram: &LatencyHistogram) -> Self {
        let risk_rejects = counters.risk_reject_kill.load(Ordering::Relaxed)
            + counters.risk_reject_stale.load(Ordering::Relaxed)
            + counters.risk_reject_price_band.load(Ordering::Relaxed)
            + counters.risk_reject_token.load(Ordering::Relaxed)
            + counters.risk_reject_position.load(Ordering::Relaxed);
        Self {
            rx_packets: counters.rx_packets.load(Ordering::Relaxed),
            rx_bytes: counters.rx_bytes.load(Ordering::Relaxed),
            seq_gaps: counters.seq_gaps.load(Ordering::Relaxed),
            seq_dupes: counters.seq_dupes.load(Ordering::Relaxed),
            parsed_messages: counters.parsed_messages.load(Ordering::Relaxed),
            book_updates: counters.book_updates.load(Ordering::Relaxed),
            risk_accepts: counters.risk_accepts.load(Ordering::Relaxed),
            risk_rejects,
            published: counters.published.load(Ordering::Relaxed),
            ring_drops: counters.ring_drops.load(Ordering::Relaxed),
            latency_mean_ns: histogram.mean_ns(),
            latency_min_ns: histogram.min_ns(),
            latency_max_ns: histogram.max_ns(),
        }
    }
}
