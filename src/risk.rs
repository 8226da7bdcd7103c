//! Pre-trade risk gate: six independent checks over every book event.
//!
//! Config fields are scalar atomics updated by a side-channel thread with
//! release stores; the data path reads them with acquire loads once per
//! evaluation, so a parameter change takes effect at message granularity
//! and never mid-check.

use crate::book::BookEvent;
use crate::decision::flag_bits;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU16, AtomicU32, Ordering};

/// Risk thresholds, independently settable from the configuration side-channel.
#[derive(Debug)]
pub struct RiskParams {
    price_band_bps: AtomicU16,
    token_rate_per_ms: AtomicU16,
    token_bucket_max: AtomicU16,
    position_limit: AtomicI32,
    stale_threshold_ns: AtomicU32,
    seq_gap_threshold: AtomicU16,
    kill: AtomicBool,
}

/// Plain field values for a bulk [`RiskParams::set`] call.
#[derive(Debug, Clone, Copy)]
pub struct RiskParamValues {
    pub price_band_bps: u16,
    pub token_rate_per_ms: u16,
    pub token_bucket_max: u16,
    pub position_limit: i32,
    pub stale_threshold_ns: u32,
    pub seq_gap_threshold: u16,
    pub kill: bool,
}

impl Default for RiskParamValues {
    fn default() -> Self {
        Self {
            price_band_bps: 0,
            token_rate_per_ms: u16::MAX,
            token_bucket_max: u16::MAX,
            position_limit: i32::MAX,
            stale_threshold_ns: u32::MAX,
            seq_gap_threshold: u16::MAX,
            kill: false,
        }
    }
}

impl RiskParams {
    pub fn new(values: RiskParamValues) -> Self {
        Self {
            price_band_bps: AtomicU16::new(values.price_band_bps),
            token_rate_per_ms: AtomicU16::new(values.token_rate_per_ms),
            token_bucket_max: AtomicU16::new(values.token_bucket_max),
            position_limit: AtomicI32::new(values.position_limit),
            stale_threshold_ns: AtomicU32::new(values.stale_threshold_ns),
            seq_gap_threshold: AtomicU16::new(values.seq_gap_threshold),
            kill: AtomicBool::new(values.kill),
        }
    }

    pub fn set(&self, values: RiskParamValues) {
        self.price_band_bps.store(values.price_band_bps, Ordering::Release);
        self.token_rate_per_ms.store(values.token_rate_per_ms, Ordering::Release);
        self.token_bucket_max.store(values.token_bucket_max, Ordering::Release);
        self.position_limit.store(values.position_limit, Ordering::Release);
        self.stale_threshold_ns.store(values.stale_threshold_ns, Ordering::Release);
        self.seq_gap_threshold.store(values.seq_gap_threshold, Ordering::Release);
        self.kill.store(values.kill, Ordering::Release);
    }

    pub fn set_kill(&self, kill: bool) {
        self.kill.store(kill, Ordering::Release);
    }

    pub fn seq_gap_threshold(&self) -> u16 {
        self.seq_gap_threshold.load(Ordering::Acquire)
    }
}

impl Default for RiskParams {
    fn default() -> Self {
        Self::new(RiskParamValues::default())
    }
}

/// Process-global token bucket: a single shared rate limiter, not one per symbol.
#[derive(Debug)]
struct TokenBucket {
    tokens: u32,
    next_replenish_ns: u64,
    initialized: bool,
}

impl TokenBucket {
    fn new() -> Self {
        Self {
            tokens: 0,
            next_replenish_ns: 0,
            initialized: false,
        }
    }

    /// Replenish based on elapsed whole milliseconds since the base, then
    /// report whether at least one token is available. The bucket starts
    /// full on its first evaluation, since `max` is only known once a
    /// `RiskParams` is supplied.
    fn replenish_and_check(&mut self, now: u64, rate_per_ms: u16, max: u16) -> bool {
        if !self.initialized {
            self.tokens = max as u32;
            self.next_replenish_ns = now;
            self.initialized = true;
            return self.tokens > 0;
        }
        let elapsed_ms = now.saturating_sub(self.next_replenish_ns) / 1_000_000;
        if elapsed_ms > 0 {
            let add = elapsed_ms.saturating_mul(rate_per_ms as u64);
            self.tokens = (self.tokens as u64 + add).min(max as u64) as u32;
            self.next_replenish_ns += elapsed_ms * 1_000_000;
        }
        self.tokens > 0
    }

    fn consume_one(&mut self) {
        self.tokens = self.tokens.saturating_sub(1);
    }
}

/// Outcome of evaluating a single book event through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskVerdict {
    pub accept: bool,
    pub flags: u8,
}

/// The six-check pre-trade gate. Owned exclusively by the data-path thread;
/// [`RiskParams`] is the only part shared with the configuration channel.
#[derive(Debug)]
pub struct RiskGate {
    bucket: TokenBucket,
}

impl RiskGate {
    pub fn new() -> Self {
        Self {
            bucket: TokenBucket::new(),
        }
    }

    /// Evaluate one book event. `now` is the decision timestamp;
    /// `ref_price` is the symbol's current reference price (0 disables the
    /// price-band check). Checks are evaluated independently; the reported
    /// reason is the highest-priority failing one: kill, stale, price-band,
    /// token-bucket, position-limit.
    pub fn evaluate(&mut self, params: &RiskParams, event: &BookEvent, ref_price: u32, now: u64) -> RiskVerdict {
        let kill = params.kill.load(Ordering::Acquire);
        let stale_threshold_ns = params.stale_threshold_ns.load(Ordering::Acquire);
        let price_band_bps = params.price_band_bps.load(Ordering::Acquire);
        let token_rate_per_ms = params.token_rate_per_ms.load(Ordering::Acquire);
        let token_bucket_max = params.token_bucket_max.load(Ordering::Acquire);
        let position_limit = params.position_limit.load(Ordering::Acquire);

        let stale_fail = event.stale || now.saturating_sub(event.book_ts) > stale_threshold_ns as u64;

        let price_band_fail = if ref_price == 0 || price_band_bps == 0 {
            false
        } else {
            let mid = mid_price(event.bid_px, event.bid_qty, event.ask_px, event.ask_qty);
            let lhs = mid.abs_diff(ref_price as u64) * 10_000;
            let rhs = ref_price as u64 * price_band_bps as u64;
            lhs > rhs
        };

        let token_pass = self.bucket.replenish_and_check(now, token_rate_per_ms, token_bucket_max);

        let position_fail = !within_position_limit(event.bid_qty, position_limit)
            || !within_position_limit(event.ask_qty, position_limit);

        let accept = !kill && !stale_fail && !price_band_fail && token_pass && !position_fail;

        let mut flags = 0u8;
        if accept {
            flags |= 1 << flag_bits::ACCEPT;
            self.bucket.consume_one();
        } else if kill {
            flags |= 1 << flag_bits::KILL_ACTIVE;
        } else if stale_fail {
            flags |= 1 << flag_bits::STALE;
        } else if price_band_fail {
            flags |= 1 << flag_bits::PRICE_BAND_FAIL;
        } else if !token_pass {
            flags |= 1 << flag_bits::TOKEN_FAIL;
        } else {
            flags |= 1 << flag_bits::POSITION_FAIL;
        }

        RiskVerdict { accept, flags }
    }
}

impl Default for RiskGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Mid-price for the price-band check. An empty side (zero quantity) is
/// excluded rather than averaged in as a zero price; with both sides empty
/// the mid is zero and the caller's `ref_price == 0` guard is the only
/// thing that can still disable the check.
fn mid_price(bid_px: u32, bid_qty: u32, ask_px: u32, ask_qty: u32) -> u64 {
    match (bid_qty > 0, ask_qty > 0) {
        (true, true) => (bid_px as u64 + ask_px as u64) / 2,
        (true, false) => bid_px as u64,
        (false, true) => ask_px as u64,
        (false, false) => 0,
    }
}

fn within_position_limit(qty: u32, position_limit: i32) -> bool {
    if position_limit < 0 {
        true
    } else {
        qty <= position_limit as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(bid_px: u32, bid_qty: u32, ask_px: u32, ask_qty: u32, stale: bool) -> BookEvent {
        BookEvent {
            ingress_ts: 0,
            book_ts: 0,
            symbol_index: 0,
            bid_px,
            bid_qty,
            ask_px,
            ask_qty,
            last_trade_px: 0,
            last_trade_qty: 0,
            stale,
            triggering_msg_type: b'A',
        }
    }

    #[test]
    fn kill_switch_takes_precedence_over_everything() {
        let params = RiskParams::new(RiskParamValues {
            kill: true,
            ..Default::default()
        });
        let mut gate = RiskGate::new();
        let verdict = gate.evaluate(&params, &event(1_500_000, 100, 0, 0, false), 1_500_000, 100);
        assert!(!verdict.accept);
        assert_eq!(verdict.flags, 1 << flag_bits::KILL_ACTIVE);
    }

    #[test]
    fn price_band_reject_when_mid_drifts_past_band() {
        let params = RiskParams::new(RiskParamValues {
            price_band_bps: 500,
            ..Default::default()
        });
        let mut gate = RiskGate::new();
        let verdict = gate.evaluate(&params, &event(1_100_000, 100, 0, 0, false), 1_000_000, 100);
        assert!(!verdict.accept);
        assert_eq!(verdict.flags, 1 << flag_bits::PRICE_BAND_FAIL);
    }

    #[test]
    fn one_sided_book_uses_the_populated_side_as_mid() {
        // An empty ask must not drag the mid toward zero.
        let params = RiskParams::new(RiskParamValues {
            price_band_bps: 10_000, // 100% band: only a gross mid error would reject
            ..Default::default()
        });
        let mut gate = RiskGate::new();
        let verdict = gate.evaluate(&params, &event(1_000_000, 100, 0, 0, false), 1_000_000, 100);
        assert!(verdict.accept, "mid must equal the bid, not (bid+0)/2, when ask is empty");
    }

    #[test]
    fn zero_ref_price_disables_price_band_check() {
        let params = RiskParams::new(RiskParamValues {
            price_band_bps: 1,
            ..Default::default()
        });
        let mut gate = RiskGate::new();
        let verdict = gate.evaluate(&params, &event(9_000_000, 10, 0, 0, false), 0, 100);
        assert!(verdict.accept);
    }

    #[test]
    fn token_bucket_exhausts_after_max_accepts() {
        let params = RiskParams::new(RiskParamValues {
            token_rate_per_ms: 1,
            token_bucket_max: 3,
            ..Default::default()
        });
        let mut gate = RiskGate::new();
        let ev = event(1_000_000, 10, 0, 0, false);
        let mut accepts = 0;
        let mut token_rejects = 0;
        for i in 0..5u64 {
            let verdict = gate.evaluate(&params, &ev, 0, i);
            if verdict.accept {
                accepts += 1;
            } else if verdict.flags == 1 << flag_bits::TOKEN_FAIL {
                token_rejects += 1;
            }
        }
        assert_eq!(accepts, 3);
        assert_eq!(token_rejects, 2);
    }

    #[test]
    fn position_limit_rejects_oversized_side() {
        let params = RiskParams::new(RiskParamValues {
            position_limit: 50,
            ..Default::default()
        });
        let mut gate = RiskGate::new();
        let verdict = gate.evaluate(&params, &event(1_000_000, 100, 0, 0, false), 0, 100);
        assert!(!verdict.accept);
        assert_eq!(verdict.flags, 1 << flag_bits::POSITION_FAIL);
    }

    #[test]
    fn stale_flag_on_event_rejects_regardless_of_age() {
        let params = RiskParams::default();
        let mut gate = RiskGate::new();
        let verdict = gate.evaluate(&params, &event(1_000_000, 1, 0, 0, true), 0, 0);
        assert!(!verdict.accept);
        assert_eq!(verdict.flags, 1 << flag_bits::STALE);
    }
}
